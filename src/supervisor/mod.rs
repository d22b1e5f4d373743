//! Supervisor-proxied controller API client
//!
//! All controller access goes through the Supervisor proxy: the configured
//! timezone from `/core/api/config` and history snapshots from
//! `/core/api/history/period/...`. Every request carries the ambient
//! `SUPERVISOR_TOKEN` as a bearer credential.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::TimeWindow;

/// Base URL of the Supervisor proxy inside the add-on container
pub const SUPERVISOR_URL: &str = "http://supervisor";

/// Environment variable carrying the Supervisor bearer token
pub const TOKEN_ENV: &str = "SUPERVISOR_TOKEN";

/// Timeout for small control-plane lookups (controller config)
pub const CONFIG_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for history fetches, which can return very large payloads
pub const HISTORY_TIMEOUT: Duration = Duration::from_secs(300);

/// Raised when the process credential is unavailable
#[derive(Error, Debug)]
pub enum AuthError {
    /// SUPERVISOR_TOKEN is unset or empty
    #[error("SUPERVISOR_TOKEN is not available")]
    MissingToken,
}

/// Errors that can occur during Supervisor API calls
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success response from the Supervisor
    #[error("Supervisor returned status {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Controller reports a timezone this build does not know
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoreConfig {
    #[serde(default = "default_time_zone")]
    time_zone: String,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Client for the Supervisor-proxied controller API
pub struct SupervisorClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SupervisorClient {
    /// Create a client with an explicit base URL and token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().gzip(true).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    /// Create a client using the ambient process credential
    ///
    /// The token is read from the environment on every construction, so
    /// callers that build a fresh client per cycle pick up rotations.
    pub fn from_env(base_url: impl Into<String>) -> crate::error::Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        Ok(Self::new(base_url, token)?)
    }

    /// Resolve the controller's configured timezone
    ///
    /// A controller that reports no `time_zone` is treated as UTC.
    pub async fn timezone(&self) -> Result<Tz, FetchError> {
        let url = format!("{}/core/api/config", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(CONFIG_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let config: CoreConfig = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let tz = Tz::from_str(&config.time_zone)
            .map_err(|_| FetchError::UnknownTimezone(config.time_zone.clone()))?;

        tracing::info!(timezone = %config.time_zone, "Using controller timezone");
        Ok(tz)
    }

    /// Fetch the raw history payload for a window
    ///
    /// Not retried at this layer; a failure propagates to the caller as-is.
    pub async fn fetch_history(&self, window: &TimeWindow) -> Result<serde_json::Value, FetchError> {
        let start_iso = window.start.to_rfc3339();
        let end_iso = window.end.to_rfc3339();

        tracing::info!(start = %start_iso, end = %end_iso, "Fetching history window");

        let url = format!("{}/core/api/history/period/{}", self.base_url, start_iso);

        let response = self
            .client
            .get(&url)
            .query(&[("end_time", end_iso.as_str()), ("no_attributes", "false")])
            .bearer_auth(&self.token)
            .timeout(HISTORY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_config_defaults_to_utc() {
        let config: CoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.time_zone, "UTC");
    }

    #[test]
    fn test_core_config_reads_time_zone() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"time_zone": "Asia/Seoul", "version": "2024.1"}"#).unwrap();
        assert_eq!(config.time_zone, "Asia/Seoul");
        assert!(Tz::from_str(&config.time_zone).is_ok());
    }

    #[test]
    fn test_unknown_timezone_name_does_not_resolve() {
        assert!(Tz::from_str("Not/AZone").is_err());
    }
}
