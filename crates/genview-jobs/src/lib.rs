//! genview Jobs - generation backend client and job tracking
//!
//! Provides the job status API client, the status poller with backoff and
//! cancellation, and the simulated progress estimate shown while a job runs.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod progress;
pub mod types;

pub use client::{JobApi, JobClient};
pub use config::{ApiConfig, EstimatorConfig, PollerConfig};
pub use error::JobError;
pub use poller::{JobPoller, PollerState};
pub use progress::ProgressEstimator;
pub use types::*;
