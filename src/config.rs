/// Client configuration
///
/// Endpoint URLs and upload settings. Loaded from
/// `<config dir>/visage-check/config.json` when present, then overridden by
/// environment variables. Every field has a default, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prediction endpoint used by the Flask server
pub const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:8080/predict";
/// Recommendation endpoint base; the label is appended as a path segment
pub const DEFAULT_RECOMMENDATIONS_URL: &str = "http://127.0.0.1:8080/recommendations";
/// Multipart field name the server reads the image from
pub const DEFAULT_UPLOAD_FIELD: &str = "file";

const ENV_PREDICT_URL: &str = "VISAGE_PREDICT_URL";
const ENV_RECOMMENDATIONS_URL: &str = "VISAGE_RECOMMENDATIONS_URL";
const ENV_UPLOAD_FIELD: &str = "VISAGE_UPLOAD_FIELD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Full URL of the prediction endpoint (`/predict` or `/api/analyze/`)
    pub predict_url: String,
    /// Base URL of the recommendation endpoint
    pub recommendations_url: String,
    /// Multipart field name for the uploaded image
    pub upload_field: String,
    /// Class list the `probabilities` array is parallel to.
    /// Empty when the server does not publish one.
    pub classes: Vec<String>,
    /// Minimum time the "analyzing" state is held, in milliseconds
    pub min_progress_ms: u64,
    /// Per-request timeout in seconds; `None` keeps the transport default
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            predict_url: DEFAULT_PREDICT_URL.to_string(),
            recommendations_url: DEFAULT_RECOMMENDATIONS_URL.to_string(),
            upload_field: DEFAULT_UPLOAD_FIELD.to_string(),
            classes: Vec::new(),
            min_progress_ms: 0,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load the user config, falling back to defaults when no file exists,
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Where the config file lives:
    /// - Linux: ~/.config/visage-check/config.json
    /// - macOS: ~/Library/Application Support/visage-check/config.json
    /// - Windows: %APPDATA%\visage-check\config.json
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("visage-check");
        path.push("config.json");
        Some(path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Override fields from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_PREDICT_URL) {
            self.predict_url = url;
        }
        if let Some(url) = get(ENV_RECOMMENDATIONS_URL) {
            self.recommendations_url = url;
        }
        if let Some(field) = get(ENV_UPLOAD_FIELD) {
            self.upload_field = field;
        }
    }

    pub fn min_progress(&self) -> Duration {
        Duration::from_millis(self.min_progress_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
