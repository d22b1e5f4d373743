//! Unified error handling for the histrelay crate
//!
//! Domain-specific errors live in their own modules; this enum wraps them
//! for the loop and handler boundaries that must treat any failure
//! uniformly (log plus cooldown in the scheduler, HTTP 500 in the trigger
//! server).

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::config::ConfigError;
pub use crate::export::uploader::UploadError;
pub use crate::supervisor::{AuthError, FetchError};

/// Unified error type for the histrelay crate
#[derive(Error, Debug)]
pub enum Error {
    /// Options loading or validation failed
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Process credential is unavailable
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Supervisor API call failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Destination delivery failed
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

impl Error {
    /// Whether a later cycle can reasonably succeed without operator action
    ///
    /// Network-facing failures are transient; broken options or a missing
    /// credential need a config or environment change first.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Upload(_))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
