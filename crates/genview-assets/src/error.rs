/// Broad class of an asset failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetErrorKind {
    /// The bytes never arrived (connection, status code, dropped download)
    Network,
    /// The bytes arrived but are not a usable glTF scene
    Parse,
}

/// Errors that can occur during asset loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("network error fetching '{url}': {message}")]
    Transport { url: String, message: String },

    #[error("server returned {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to parse glTF from '{url}': {message}")]
    Malformed { url: String, message: String },

    #[error("glTF from '{url}' contains no scene")]
    EmptyScene { url: String },
}

impl AssetError {
    pub fn transport(url: &str, message: impl ToString) -> Self {
        AssetError::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn malformed(url: &str, message: impl ToString) -> Self {
        AssetError::Malformed {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> AssetErrorKind {
        match self {
            AssetError::Transport { .. } | AssetError::HttpStatus { .. } => AssetErrorKind::Network,
            AssetError::Malformed { .. } | AssetError::EmptyScene { .. } => AssetErrorKind::Parse,
        }
    }

    /// The source the failing load was attempting
    pub fn url(&self) -> &str {
        match self {
            AssetError::Transport { url, .. }
            | AssetError::HttpStatus { url, .. }
            | AssetError::Malformed { url, .. }
            | AssetError::EmptyScene { url } => url,
        }
    }
}
