use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use genview_core::PendingRequest;
use reqwest::Client;

use crate::api::JobsApi;
use crate::config::ApiConfig;
use crate::error::JobError;
use crate::types::Job;

/// The job operations the poller consumes.
///
/// Implementations must return immediately; the work completes through the
/// returned `PendingRequest`, which the caller drains on its frame thread.
pub trait JobApi {
    /// Fetch the current state of a job
    fn fetch_status(&self, job_id: &str) -> PendingRequest<Job, JobError>;

    /// Best-effort cancellation of a job
    fn cancel_job(&self, job_id: &str) -> PendingRequest<(), JobError>;

    /// Fetchable URL of the asset a completed job produced
    fn asset_url(&self, job: &Job) -> Option<String> {
        job.asset_url().map(str::to_owned)
    }
}

impl<T: JobApi + ?Sized> JobApi for Rc<T> {
    fn fetch_status(&self, job_id: &str) -> PendingRequest<Job, JobError> {
        (**self).fetch_status(job_id)
    }

    fn cancel_job(&self, job_id: &str) -> PendingRequest<(), JobError> {
        (**self).cancel_job(job_id)
    }

    fn asset_url(&self, job: &Job) -> Option<String> {
        (**self).asset_url(job)
    }
}

/// Facade for all generation backend interactions.
/// Owns a background tokio runtime and dispatches async work via channels.
pub struct JobClient {
    runtime: tokio::runtime::Runtime,
    http: Client,
    api: Arc<JobsApi>,
    online: Arc<AtomicBool>,
}

impl JobClient {
    /// Create a new client with a background tokio runtime.
    pub fn new(config: &ApiConfig) -> Result<Self, JobError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| JobError::Network(format!("Failed to create runtime: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JobError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let api = Arc::new(JobsApi::new(http.clone(), config.base_url.clone()));

        Ok(Self {
            runtime,
            http,
            api,
            online: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle to the background runtime, for other network consumers
    pub fn runtime_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// The shared HTTP client
    pub fn http_client(&self) -> Client {
        self.http.clone()
    }

    /// Whether the server appears to be online (based on last request result).
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

impl JobApi for JobClient {
    fn fetch_status(&self, job_id: &str) -> PendingRequest<Job, JobError> {
        let (responder, pending) = PendingRequest::channel();
        let api = Arc::clone(&self.api);
        let online = Arc::clone(&self.online);
        let job_id = job_id.to_string();

        self.runtime.spawn(async move {
            let result = api.status(&job_id).await;
            match &result {
                Ok(_) => online.store(true, Ordering::Relaxed),
                Err(JobError::Offline) => online.store(false, Ordering::Relaxed),
                _ => {}
            }
            responder.send(result);
        });

        pending
    }

    fn cancel_job(&self, job_id: &str) -> PendingRequest<(), JobError> {
        let (responder, pending) = PendingRequest::channel();
        let api = Arc::clone(&self.api);
        let job_id = job_id.to_string();

        self.runtime.spawn(async move {
            responder.send(api.cancel(&job_id).await);
        });

        pending
    }

    fn asset_url(&self, job: &Job) -> Option<String> {
        job.asset_url().map(|reference| self.api.resolve_url(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobResult, JobStatus};

    #[test]
    fn test_error_type_mapping() {
        let offline = JobError::Offline;
        assert!(offline.to_string().contains("offline"));

        let server = JobError::ServerError { status: 502, message: "Bad gateway".into() };
        assert!(server.to_string().contains("502"));

        let timeout = JobError::Timeout;
        assert!(timeout.to_string().contains("timed out"));

        let closed: JobError = genview_core::ChannelClosed.into();
        assert!(matches!(closed, JobError::ChannelClosed));
    }

    #[test]
    fn test_client_resolves_relative_asset_urls() {
        let config = ApiConfig {
            base_url: "https://gen.example.com/".into(),
            timeout_secs: 5,
        };
        let client = JobClient::new(&config).unwrap();

        let mut job = Job::new("j1", JobStatus::Completed);
        job.result = Some(JobResult {
            glb_url: Some("files/j1.glb".into()),
            preview_url: None,
            elapsed_seconds: 12.0,
        });
        assert_eq!(
            client.asset_url(&job).as_deref(),
            Some("https://gen.example.com/files/j1.glb")
        );
        assert!(!client.is_online());
    }
}
