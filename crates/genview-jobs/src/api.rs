use reqwest::Client;
use tracing::debug;

use crate::error::JobError;
use crate::types::Job;

/// HTTP calls against the generation backend's job endpoints
pub struct JobsApi {
    client: Client,
    base_url: String,
}

impl JobsApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}", self.base_url, job_id)
    }

    pub fn cancel_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}/cancel", self.base_url, job_id)
    }

    /// Turn an asset reference from a job result into a fetchable URL
    pub fn resolve_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
        }
    }

    /// Fetch the current state of a job
    pub async fn status(&self, job_id: &str) -> Result<Job, JobError> {
        let url = self.status_url(job_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(JobError::NotFound(job_id.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(JobError::ServerError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Ask the backend to stop a job
    pub async fn cancel(&self, job_id: &str) -> Result<(), JobError> {
        let url = self.cancel_url(job_id);
        debug!("POST {}", url);

        let response = self.client.post(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(JobError::ServerError {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let api = JobsApi::new(Client::new(), "https://gen.example.com/api/");
        assert_eq!(api.base_url(), "https://gen.example.com/api");
        assert_eq!(api.status_url("j1"), "https://gen.example.com/api/jobs/j1");
        assert_eq!(api.cancel_url("j1"), "https://gen.example.com/api/jobs/j1/cancel");
    }

    #[test]
    fn test_resolve_relative_and_absolute_urls() {
        let api = JobsApi::new(Client::new(), "https://gen.example.com");
        assert_eq!(
            api.resolve_url("/files/j1/model.glb"),
            "https://gen.example.com/files/j1/model.glb"
        );
        assert_eq!(
            api.resolve_url("https://cdn.example.com/model.glb"),
            "https://cdn.example.com/model.glb"
        );
    }
}
