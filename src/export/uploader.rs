//! Retrying destination uploader
//!
//! Delivers a serialized export envelope to the destination endpoint,
//! tolerating transient transport failures with exponential backoff. The
//! payload carries no idempotency key, so retries and overlapping runs may
//! reach the destination more than once; the destination must tolerate
//! duplicate delivery.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::models::ExportEnvelope;

/// Maximum delivery attempts per envelope
pub const MAX_UPLOAD_ATTEMPTS: u32 = 5;

/// Backoff before the second attempt; doubles on each retry
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Timeout for a single upload attempt
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for the one-shot destination probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised on the destination path
#[derive(Error, Debug)]
pub enum UploadError {
    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Every attempt failed at the transport level
    #[error("Upload failed after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// One-shot connectivity probe failed
    #[error("Destination probe failed: {0}")]
    Probe(#[source] reqwest::Error),
}

/// Destination uploader with bounded exponential-backoff retry
#[derive(Debug, Clone)]
pub struct Uploader {
    max_attempts: u32,
    initial_backoff: Duration,
    timeout: Duration,
}

impl Default for Uploader {
    fn default() -> Self {
        Self {
            max_attempts: MAX_UPLOAD_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
            timeout: UPLOAD_TIMEOUT,
        }
    }
}

impl Uploader {
    /// Create an uploader with the standard retry schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an uploader with a custom retry schedule
    pub fn with_config(max_attempts: u32, initial_backoff: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            timeout,
        }
    }

    /// Deliver one envelope, retrying transport failures
    ///
    /// A response of any status counts as delivered; only transport-level
    /// failures (connect errors, timeouts) are retried, with backoffs of
    /// 1, 2, 4, 8 seconds before attempts two through five. The identical
    /// payload is sent on every attempt.
    ///
    /// The client is rebuilt per call so `verify_tls` always reflects the
    /// options the caller just reloaded.
    pub async fn upload(
        &self,
        destination_url: &str,
        destination_key: &str,
        verify_tls: bool,
        envelope: &ExportEnvelope,
    ) -> Result<(), UploadError> {
        let client = build_client(self.timeout, verify_tls).map_err(UploadError::Client)?;

        tracing::info!(url = %destination_url, "Uploading export envelope");

        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = client
                .post(destination_url)
                .bearer_auth(destination_key)
                .json(envelope)
                .send()
                .await;

            match result {
                Ok(response) => {
                    tracing::info!(
                        status = %response.status(),
                        attempt,
                        "Upload completed"
                    );
                    return Ok(());
                }
                Err(err) if attempt >= self.max_attempts => {
                    tracing::error!(
                        attempts = attempt,
                        error = %err,
                        "Upload failed, giving up"
                    );
                    return Err(UploadError::Exhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        backoff_secs = backoff.as_secs_f64(),
                        "Upload attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

/// Fire a single small POST at the destination and report its status code
///
/// Deliberately bypasses the retry schedule and the history pipeline so the
/// check stays fast and leaves the controller untouched.
pub async fn probe_destination(
    destination_url: &str,
    destination_key: &str,
    verify_tls: bool,
) -> Result<u16, UploadError> {
    let client = build_client(PROBE_TIMEOUT, verify_tls).map_err(UploadError::Client)?;

    let response = client
        .post(destination_url)
        .bearer_auth(destination_key)
        .json(&serde_json::json!({ "test": true }))
        .send()
        .await
        .map_err(UploadError::Probe)?;

    Ok(response.status().as_u16())
}

fn build_client(timeout: Duration, verify_tls: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uploader_schedule() {
        let uploader = Uploader::new();
        assert_eq!(uploader.max_attempts, MAX_UPLOAD_ATTEMPTS);
        assert_eq!(uploader.initial_backoff, Duration::from_secs(1));
        assert_eq!(uploader.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_with_config_clamps_to_one_attempt() {
        let uploader = Uploader::with_config(0, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(uploader.max_attempts, 1);
    }

    #[test]
    fn test_client_honors_tls_opt_out() {
        assert!(build_client(Duration::from_secs(1), false).is_ok());
        assert!(build_client(Duration::from_secs(1), true).is_ok());
    }
}
