//! Add-on options loading and validation
//!
//! Options are stored by the Supervisor as a JSON document at a fixed
//! well-known path. They are re-read from disk immediately before every
//! scheduled or manual export, so edits take effect on the next run without
//! a restart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Well-known location of the add-on options file
pub const OPTIONS_PATH: &str = "/data/options.json";

/// Validated add-on options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Local hour (0-23) at which the daily export fires
    pub upload_hour: u8,

    /// Destination endpoint for export envelopes
    pub destination_url: String,

    /// Bearer credential presented to the destination
    pub destination_key: String,

    /// Size of the history window in days
    pub history_days: u32,

    /// Verify the destination's TLS certificate
    pub verify_tls: bool,
}

/// Errors that can occur while loading or validating options
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Options file could not be read
    #[error("Failed to read options file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Options file is not valid JSON or is missing a required field
    #[error("Invalid options file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// upload_hour outside the 0-23 range
    #[error("upload_hour must be between 0 and 23, got {0}")]
    UploadHourOutOfRange(u8),

    /// history_days of zero would produce an empty window
    #[error("history_days must be at least 1")]
    EmptyHistoryWindow,

    /// destination_url is not a usable http(s) URL
    #[error("Invalid destination_url '{url}': {reason}")]
    InvalidDestinationUrl { url: String, reason: String },
}

impl Options {
    /// Load and validate options from the well-known path
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Path::new(OPTIONS_PATH))
    }

    /// Load and validate options from a specific path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let options: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        options.validate()?;
        Ok(options)
    }

    /// Validate option values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_hour > 23 {
            return Err(ConfigError::UploadHourOutOfRange(self.upload_hour));
        }

        if self.history_days == 0 {
            return Err(ConfigError::EmptyHistoryWindow);
        }

        let url =
            Url::parse(&self.destination_url).map_err(|e| ConfigError::InvalidDestinationUrl {
                url: self.destination_url.clone(),
                reason: e.to_string(),
            })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidDestinationUrl {
                url: self.destination_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_options() -> Options {
        Options {
            upload_hour: 3,
            destination_url: "https://collector.example.com/ingest".to_string(),
            destination_key: "secret".to_string(),
            history_days: 2,
            verify_tls: true,
        }
    }

    #[test]
    fn test_valid_options_pass_validation() {
        assert!(valid_options().validate().is_ok());
    }

    #[test]
    fn test_hour_24_rejected() {
        let mut options = valid_options();
        options.upload_hour = 24;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::UploadHourOutOfRange(24))
        ));
    }

    #[test]
    fn test_zero_history_days_rejected() {
        let mut options = valid_options();
        options.history_days = 0;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::EmptyHistoryWindow)
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut options = valid_options();
        options.destination_url = "ftp://collector.example.com".to_string();
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidDestinationUrl { .. })
        ));
    }

    #[test]
    fn test_options_deserialization() {
        let json = r#"{
            "upload_hour": 3,
            "destination_url": "https://x.example",
            "destination_key": "k",
            "history_days": 7,
            "verify_tls": false
        }"#;

        let options: Options = serde_json::from_str(json).unwrap();
        assert_eq!(options.upload_hour, 3);
        assert_eq!(options.history_days, 7);
        assert!(!options.verify_tls);
    }

    #[test]
    fn test_missing_field_fails_deserialization() {
        let json = r#"{"upload_hour": 3}"#;
        assert!(serde_json::from_str::<Options>(json).is_err());
    }
}
