//! Simulated generation progress
//!
//! The backend reports no incremental progress, so the readout is a linear ramp
//! that is capped below 100 until the job actually leaves the active states.
//! The value is for presentation only and says nothing about real elapsed work.

use std::time::Duration;

use tracing::debug;

use crate::config::EstimatorConfig;
use crate::types::JobStatus;

/// Linear ramp-then-cap progress estimate for one job at a time
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    config: EstimatorConfig,
    job_id: Option<String>,
    value: f64,
    ticking: bool,
    finished: bool,
    /// The frame that started the ramp has not been skipped yet
    skip_next: bool,
    /// Time accumulated toward the next tick
    carry: Duration,
}

impl ProgressEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            job_id: None,
            value: 0.0,
            ticking: false,
            finished: false,
            skip_next: false,
            carry: Duration::ZERO,
        }
    }

    /// Feed the latest known status of `job_id`.
    ///
    /// A different id restarts from zero. An active status starts the ramp; any
    /// terminal status snaps the value to 100 and stops it.
    pub fn observe(&mut self, job_id: &str, status: JobStatus) {
        if self.job_id.as_deref() != Some(job_id) {
            self.reset();
            self.job_id = Some(job_id.to_string());
        }

        if status.is_terminal() {
            self.finish();
        } else if !self.finished && !self.ticking && self.value < self.config.cap {
            debug!("Starting progress ramp for job {}", job_id);
            self.ticking = true;
            self.skip_next = true;
        }
    }

    /// Advance the ramp by elapsed frame time.
    ///
    /// The delta of the frame in which the ramp started predates the job and is
    /// not counted.
    pub fn advance(&mut self, delta: Duration) {
        if !self.ticking {
            return;
        }
        if self.skip_next {
            self.skip_next = false;
            return;
        }

        let tick = self.config.tick();
        let step = self.config.step();
        self.carry += delta;
        while self.carry >= tick {
            self.carry -= tick;
            self.value = (self.value + step).min(self.config.cap);
            if self.value >= self.config.cap {
                // Frozen until the job really finishes
                self.ticking = false;
                self.carry = Duration::ZERO;
                break;
            }
        }
    }

    /// Jump to 100 and stop ticking
    pub fn finish(&mut self) {
        self.value = 100.0;
        self.ticking = false;
        self.finished = true;
        self.skip_next = false;
        self.carry = Duration::ZERO;
    }

    /// Forget the current job and return to zero
    pub fn reset(&mut self) {
        self.job_id = None;
        self.value = 0.0;
        self.ticking = false;
        self.finished = false;
        self.skip_next = false;
        self.carry = Duration::ZERO;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whole-number percentage for display
    pub fn percent(&self) -> u32 {
        self.value.round() as u32
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const TICK: Duration = Duration::from_millis(500);

    fn run_ticks(estimator: &mut ProgressEstimator, total_ms: u64) {
        for _ in 0..total_ms / 500 {
            estimator.advance(TICK);
        }
    }

    #[test]
    fn test_ramp_reaches_half_at_75_seconds() {
        let mut estimator = ProgressEstimator::default();
        estimator.observe("j1", JobStatus::Pending);
        run_ticks(&mut estimator, 75_000);
        assert!((estimator.value() - 50.0).abs() <= 1.0, "got {}", estimator.value());
        assert_eq!(estimator.percent(), 50);
    }

    #[test]
    fn test_ramp_caps_at_99_then_snaps_to_100() {
        let mut estimator = ProgressEstimator::default();
        estimator.observe("j1", JobStatus::Pending);
        run_ticks(&mut estimator, 150_000);
        assert_eq!(estimator.value(), 99.0);

        run_ticks(&mut estimator, 60_000);
        estimator.observe("j1", JobStatus::Processing);
        run_ticks(&mut estimator, 60_000);
        assert_eq!(estimator.value(), 99.0);
        assert!(!estimator.is_ticking());

        estimator.observe("j1", JobStatus::Completed);
        assert_eq!(estimator.value(), 100.0);
        estimator.advance(TICK);
        assert_eq!(estimator.value(), 100.0);
    }

    #[test]
    fn test_any_terminal_status_snaps_to_100() {
        for status in [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
            let mut estimator = ProgressEstimator::default();
            estimator.observe("j1", JobStatus::Processing);
            run_ticks(&mut estimator, 10_000);
            estimator.observe("j1", status);
            assert_eq!(estimator.value(), 100.0, "status {status}");
            assert!(!estimator.is_ticking());
        }
    }

    #[test]
    fn test_never_exceeds_cap_while_active() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let mut estimator = ProgressEstimator::default();
            estimator.observe("j1", JobStatus::Pending);
            let mut previous = estimator.value();
            let mut elapsed = 0u64;
            while elapsed < 400_000 {
                let dt = rng.gen_range(1..2_000);
                elapsed += dt;
                estimator.advance(Duration::from_millis(dt));
                if rng.gen_bool(0.01) {
                    estimator.observe("j1", JobStatus::Processing);
                }
                let value = estimator.value();
                assert!(value >= previous, "went backwards: {previous} -> {value}");
                assert!(value <= 99.0, "exceeded cap: {value}");
                previous = value;
            }
        }
    }

    #[test]
    fn test_partial_ticks_carry_over() {
        let mut estimator = ProgressEstimator::default();
        estimator.observe("j1", JobStatus::Pending);
        estimator.advance(TICK);
        estimator.advance(Duration::from_millis(300));
        assert_eq!(estimator.value(), 0.0);
        estimator.advance(Duration::from_millis(300));
        assert!((estimator.value() - 100.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_frame_after_start_is_not_counted() {
        let mut estimator = ProgressEstimator::default();
        estimator.observe("j1", JobStatus::Pending);
        estimator.advance(Duration::from_secs(30));
        assert_eq!(estimator.value(), 0.0);
        assert!(estimator.is_ticking());

        estimator.advance(TICK);
        assert!((estimator.value() - 100.0 / 300.0).abs() < 1e-9);

        // Later statuses for the same job do not skip again
        estimator.observe("j1", JobStatus::Processing);
        estimator.advance(TICK);
        assert!((estimator.value() - 200.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_job_resets_to_zero() {
        let mut estimator = ProgressEstimator::default();
        estimator.observe("a", JobStatus::Processing);
        run_ticks(&mut estimator, 30_000);
        estimator.observe("a", JobStatus::Completed);
        assert_eq!(estimator.value(), 100.0);

        estimator.observe("b", JobStatus::Pending);
        assert_eq!(estimator.value(), 0.0);
        assert_eq!(estimator.job_id(), Some("b"));
        assert!(estimator.is_ticking());
    }

    #[test]
    fn test_idle_estimator_does_not_tick() {
        let mut estimator = ProgressEstimator::default();
        run_ticks(&mut estimator, 10_000);
        assert_eq!(estimator.value(), 0.0);
    }
}
