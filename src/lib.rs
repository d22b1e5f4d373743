//! histrelay - Home Assistant history relay
//!
//! A small always-on service that snapshots a time window of controller
//! history once a day and relays it to an external HTTP endpoint, with a
//! manual trigger surface for on-demand runs.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Add-on options loading and validation
//! - [`supervisor`] - Supervisor-proxied controller API client
//! - [`models`] - Time windows and the export envelope wire format
//! - [`export`] - Export orchestration and the retrying uploader
//! - [`schedule`] - Fire-time arithmetic and the perpetual daily loop
//! - [`server`] - Manual trigger HTTP surface
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use histrelay::config::Options;
//! use histrelay::export::Exporter;
//! use histrelay::supervisor::SupervisorClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = Options::load_default()?;
//!     let supervisor = SupervisorClient::from_env("http://supervisor")?;
//!     let tz = supervisor.timezone().await?;
//!     Exporter::new().run_once(&options, &supervisor, tz).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod schedule;
pub mod server;
pub mod supervisor;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigError, Options};
    pub use crate::error::{Error, Result};
    pub use crate::export::{Exporter, UploadError, Uploader};
    pub use crate::models::{ExportEnvelope, ExportMeta, TimeWindow};
    pub use crate::schedule::Scheduler;
    pub use crate::supervisor::{AuthError, FetchError, SupervisorClient};
}

// Direct re-exports for convenience
pub use models::{ExportEnvelope, ExportMeta, TimeWindow};
