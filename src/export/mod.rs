//! Export orchestration
//!
//! One export run: compute the lookback window ending now, fetch the
//! controller history for it, wrap it in an envelope, and hand it to the
//! retrying uploader.

pub mod uploader;

pub use uploader::{UploadError, Uploader};

use chrono::Utc;
use chrono_tz::Tz;

use crate::config::Options;
use crate::error::Result;
use crate::models::{ExportEnvelope, TimeWindow};
use crate::supervisor::SupervisorClient;

/// Drives one export run end to end
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    uploader: Uploader,
}

impl Exporter {
    /// Create an exporter with the standard upload schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exporter around a custom uploader
    pub fn with_uploader(uploader: Uploader) -> Self {
        Self { uploader }
    }

    /// Produce one export envelope and deliver it
    ///
    /// The window ends now in the controller's timezone and reaches back
    /// `history_days` exact days. The history fetch is not retried here and
    /// its failure propagates to the caller; upload exhaustion propagates
    /// unchanged.
    pub async fn run_once(
        &self,
        options: &Options,
        supervisor: &SupervisorClient,
        tz: Tz,
    ) -> Result<()> {
        let end = Utc::now().with_timezone(&tz);
        let window = TimeWindow::lookback(end, options.history_days);

        let history = supervisor.fetch_history(&window).await?;
        let envelope = ExportEnvelope::new(&window, options.history_days, history);

        self.uploader
            .upload(
                &options.destination_url,
                &options.destination_key,
                options.verify_tls,
                &envelope,
            )
            .await?;

        Ok(())
    }
}
