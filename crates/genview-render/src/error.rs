use genview_assets::AssetError;

/// Errors raised by a rendering backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("surface already has a live renderer")]
    SurfaceBusy,

    #[error("rendering context lost")]
    ContextLost,

    #[error("renderer backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the viewer
#[derive(Debug, Clone, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to load model from '{url}': {error}")]
    AssetLoad { url: String, error: AssetError },

    #[error("failed to set up viewer surface: {0}")]
    Surface(#[from] RenderError),
}

impl ViewerError {
    /// The asset source that was being displayed when the error happened
    pub fn attempted_source(&self) -> Option<&str> {
        match self {
            ViewerError::AssetLoad { url, .. } => Some(url),
            ViewerError::Surface(_) => None,
        }
    }
}
