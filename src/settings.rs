//! Viewer settings with persistence
//!
//! Settings are saved to `~/.config/genview/settings.toml`

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use genview_jobs::{ApiConfig, EstimatorConfig, PollerConfig};
use genview_render::ViewerConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All settings, one table per component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub poller: PollerConfig,
    pub estimator: EstimatorConfig,
    pub viewer: ViewerConfig,
}

impl Settings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("genview"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating config directory {:?}", dir))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("writing {:?}", path))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_survive_toml() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        let parsed = Settings::parse(&text).unwrap();
        assert_eq!(parsed.poller.interval_ms, 5000);
        assert_eq!(parsed.estimator.ramp_ms, 150_000);
        assert_eq!(parsed.viewer, ViewerConfig::default());
    }

    #[test]
    fn test_missing_tables_fall_back_to_defaults() {
        let parsed = Settings::parse("[api]\nbase_url = \"https://gen.example\"\ntimeout_secs = 5\n")
            .unwrap();
        assert_eq!(parsed.api.base_url, "https://gen.example");
        assert_eq!(parsed.poller.backoff_factor, 2);
        assert_eq!(parsed.viewer.default_zoom, 100);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(Settings::parse("[poller]\ninterval_ms = \"soon\"").is_err());
    }
}
