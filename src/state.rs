//! Display state for the job viewer
//!
//! The controller reduces poller, estimator, and viewer state into one of these
//! panels each frame. Front-ends render them; nothing here is mutated in place.

use genview_jobs::JobStatus;

const DEFAULT_FAILURE: &str = "An error occurred during generation";
const DEFAULT_CANCELLED: &str = "This job was cancelled";

/// Which panel the viewer page shows
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    /// No job tracked; the built-in placeholder model is shown
    Placeholder,
    /// Tracking started but no status has arrived yet
    LoadingJob,
    /// The job is active and no asset exists yet
    Generating {
        status: JobStatus,
        percent: u32,
        cancelling: bool,
    },
    /// The job completed with an asset
    Model {
        url: String,
        stage: ModelStage,
        elapsed_seconds: f64,
        preview_url: Option<String>,
    },
    /// The job completed but reported no asset location
    ModelUnavailable,
    Failed { message: String },
    Cancelled { message: String },
}

/// Progress of the completed job's asset in the viewer
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStage {
    /// No surface mounted yet
    Waiting,
    /// Downloading; percent is absent while the size is unknown
    Loading(Option<u8>),
    Ready,
    Error { source: String, message: String },
}

impl DisplayState {
    /// Failure panel text, keeping the job's own error verbatim
    pub fn failed(error: Option<&str>) -> Self {
        Self::Failed {
            message: error.unwrap_or(DEFAULT_FAILURE).to_string(),
        }
    }

    pub fn cancelled(error: Option<&str>) -> Self {
        Self::Cancelled {
            message: error.unwrap_or(DEFAULT_CANCELLED).to_string(),
        }
    }

    /// Whether the tracked job can still change
    pub fn is_active(&self) -> bool {
        matches!(self, Self::LoadingJob | Self::Generating { .. })
    }

    /// Get a human-readable description of this panel
    pub fn description(&self) -> String {
        match self {
            Self::Placeholder => "No job selected".to_string(),
            Self::LoadingJob => "Loading job status...".to_string(),
            Self::Generating { percent, cancelling, .. } => {
                if *cancelling {
                    format!("Generating your 3D model... {}% (cancelling...)", percent)
                } else {
                    format!("Generating your 3D model... {}%", percent)
                }
            }
            Self::Model {
                stage,
                elapsed_seconds,
                ..
            } => match stage {
                ModelStage::Waiting => format!("Completed in {:.1}s", elapsed_seconds),
                ModelStage::Loading(Some(percent)) => format!("Loading model... {}%", percent),
                ModelStage::Loading(None) => "Loading model...".to_string(),
                ModelStage::Ready => format!("Completed in {:.1}s", elapsed_seconds),
                ModelStage::Error { source, message } => {
                    format!("Failed to display model from {}: {}", source, message)
                }
            },
            Self::ModelUnavailable => {
                "Job completed but GLB URL is not available yet. Please refresh.".to_string()
            }
            Self::Failed { message } => format!("Generation Failed: {}", message),
            Self::Cancelled { message } => format!("Job Cancelled: {}", message),
        }
    }
}

/// Everything a front-end needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    pub state: DisplayState,
    /// Transient failure shown above the last known state
    pub advisory: Option<String>,
    /// The cancel confirmation is open
    pub cancel_prompt: bool,
    pub zoom: u32,
}

impl Display {
    /// Label of the cancel button, if cancelling is offered at all
    pub fn cancel_label(&self) -> Option<&'static str> {
        match &self.state {
            DisplayState::Generating {
                cancelling: true, ..
            } => Some("Cancelling..."),
            DisplayState::Generating { .. } => Some("Cancel Job"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(state: DisplayState) -> Display {
        Display {
            state,
            advisory: None,
            cancel_prompt: false,
            zoom: 100,
        }
    }

    #[test]
    fn test_job_errors_are_kept_verbatim() {
        assert_eq!(
            DisplayState::failed(Some("GPU out of memory")).description(),
            "Generation Failed: GPU out of memory"
        );
        assert_eq!(
            DisplayState::cancelled(None),
            DisplayState::Cancelled {
                message: "This job was cancelled".into()
            }
        );
    }

    #[test]
    fn test_cancel_is_offered_only_while_generating() {
        let generating = |cancelling| DisplayState::Generating {
            status: JobStatus::Processing,
            percent: 12,
            cancelling,
        };
        assert_eq!(display(generating(false)).cancel_label(), Some("Cancel Job"));
        assert_eq!(display(generating(true)).cancel_label(), Some("Cancelling..."));
        assert_eq!(display(DisplayState::LoadingJob).cancel_label(), None);
        assert_eq!(display(DisplayState::failed(None)).cancel_label(), None);
    }

    #[test]
    fn test_model_stage_descriptions() {
        let model = |stage| DisplayState::Model {
            url: "https://cdn/m.glb".into(),
            stage,
            elapsed_seconds: 42.0,
            preview_url: None,
        };
        assert_eq!(model(ModelStage::Loading(Some(40))).description(), "Loading model... 40%");
        assert_eq!(model(ModelStage::Ready).description(), "Completed in 42.0s");
        assert!(!model(ModelStage::Ready).is_active());
        assert!(DisplayState::LoadingJob.is_active());
    }
}
