use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Still queued or running on the backend
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    /// No further transition happens without starting a new job
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Location of the generated GLB asset, absolute or relative to the API base
    #[serde(default)]
    pub glb_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: f64,
}

/// A server-tracked generation job as returned by the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(alias = "job_id")]
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            result: None,
            error: None,
        }
    }

    /// A copy of this job with a different status. Jobs are replaced, never patched.
    pub fn with_status(&self, status: JobStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// The raw asset reference, only present on completed jobs
    pub fn asset_url(&self) -> Option<&str> {
        if self.status != JobStatus::Completed {
            return None;
        }
        self.result
            .as_ref()
            .and_then(|r| r.glb_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Processing.is_active());
        for status in [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }

    #[test]
    fn test_deserialize_completed_job() {
        let json = r#"{
            "id": "job-42",
            "status": "completed",
            "result": { "glb_url": "/files/job-42/model.glb", "elapsed_seconds": 131.5 }
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.asset_url(), Some("/files/job-42/model.glb"));
        assert_eq!(job.result.unwrap().elapsed_seconds, 131.5);
    }

    #[test]
    fn test_deserialize_failed_job_with_job_id_alias() {
        let json = r#"{ "job_id": "abc", "status": "failed", "error": "GPU out of memory" }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "abc");
        assert_eq!(job.error.as_deref(), Some("GPU out of memory"));
        assert_eq!(job.asset_url(), None);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"{ "id": "abc", "status": "exploded" }"#;
        assert!(serde_json::from_str::<Job>(json).is_err());
    }

    #[test]
    fn test_with_status_keeps_other_fields() {
        let mut job = Job::new("j1", JobStatus::Processing);
        job.error = Some("slow".into());
        let cancelled = job.with_status(JobStatus::Cancelled);
        assert_eq!(cancelled.id, "j1");
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert_eq!(cancelled.error.as_deref(), Some("slow"));
    }
}
