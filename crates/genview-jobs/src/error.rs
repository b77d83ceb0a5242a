use genview_core::ChannelClosed;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Server is offline or unreachable")]
    Offline,

    #[error("Request timed out")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Request was dropped before completing")]
    ChannelClosed,
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JobError::Timeout
        } else if err.is_connect() {
            JobError::Offline
        } else if err.is_decode() {
            JobError::Serialization(err.to_string())
        } else {
            JobError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::Serialization(err.to_string())
    }
}

impl From<ChannelClosed> for JobError {
    fn from(_: ChannelClosed) -> Self {
        JobError::ChannelClosed
    }
}
