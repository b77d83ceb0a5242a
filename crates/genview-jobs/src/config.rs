//! Job tracking configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the generation backend lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the job API, without a trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Status polling cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay between polls while the job is active
    pub interval_ms: u64,
    /// Multiplier applied to the interval after a failed fetch
    pub backoff_factor: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            backoff_factor: 2,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        self.interval() * self.backoff_factor.max(1)
    }
}

/// Shape of the simulated progress ramp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Time for the ramp to reach 100% if it were never capped
    pub ramp_ms: u64,
    /// Tick length of the ramp
    pub tick_ms: u64,
    /// Highest value shown while the job is still active
    pub cap: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            ramp_ms: 150_000,
            tick_ms: 500,
            cap: 99.0,
        }
    }
}

impl EstimatorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Percentage added per tick
    pub fn step(&self) -> f64 {
        let ticks = self.ramp_ms as f64 / self.tick_ms.max(1) as f64;
        if ticks <= 0.0 {
            return self.cap;
        }
        100.0 / ticks
    }
}
