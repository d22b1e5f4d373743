//! Daily export scheduling
//!
//! Computes wall-clock fire times in the controller's timezone and runs the
//! perpetual export loop. The loop owns no shared state: options are re-read
//! from disk and the Supervisor credential re-read from the environment
//! before every run, so the trigger server never contends with it.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Days, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::Options;
use crate::error::Result;
use crate::export::Exporter;
use crate::supervisor::SupervisorClient;

/// Pause after a failed cycle before rescheduling
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(60);

/// Floor on the pre-fire sleep, guarding against clock-skew busy loops
pub const MIN_SLEEP: Duration = Duration::from_secs(1);

/// Next instant at `hour:00:00.000` local wall clock strictly after `now`
///
/// If today's occurrence has already passed (or is exactly now), the fire
/// moves to tomorrow. A wall-clock time removed by a DST gap fires at the
/// first instant after the gap; an ambiguous fall-back time fires at its
/// earliest occurrence.
pub fn next_fire(hour: u8, now: DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    if let Some(candidate) = resolve_wall_clock(tz, today, hour) {
        if candidate > now {
            return candidate;
        }
    }

    let tomorrow = today + Days::new(1);
    resolve_wall_clock(tz, tomorrow, hour)
        // No IANA zone removes the same wall-clock hour two days in a row
        .unwrap_or_else(|| now + chrono::Duration::days(1))
}

fn resolve_wall_clock(tz: Tz, date: NaiveDate, hour: u8) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(u32::from(hour), 0, 0)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // Spring-forward gap: shift past the removed hour
            let shifted = naive + chrono::Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => Some(dt),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                LocalResult::None => None,
            }
        }
    }
}

/// Perpetual daily export loop
///
/// State machine per cycle: waiting until the fire time, then running one
/// export, then waiting again. There is no terminal state; only process
/// shutdown ends the loop.
pub struct Scheduler {
    options_path: PathBuf,
    supervisor_url: String,
    exporter: Exporter,
    cooldown: Duration,
}

impl Scheduler {
    /// Create a scheduler reading options and credentials from their
    /// standard locations
    pub fn new(options_path: impl Into<PathBuf>, supervisor_url: impl Into<String>) -> Self {
        Self {
            options_path: options_path.into(),
            supervisor_url: supervisor_url.into(),
            exporter: Exporter::new(),
            cooldown: FAILURE_COOLDOWN,
        }
    }

    /// Run the export loop forever
    ///
    /// Each cycle waits for the next fire time, reloads options, re-derives
    /// the Supervisor client, and runs one export. Any failure is logged and
    /// followed by a cooldown; nothing propagates out of the loop.
    pub async fn run(&self, initial: Options, tz: Tz) {
        let mut upload_hour = initial.upload_hour;

        loop {
            match self.cycle(upload_hour, tz).await {
                Ok(next_hour) => upload_hour = next_hour,
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        recoverable = err.is_recoverable(),
                        cooldown_secs = self.cooldown.as_secs(),
                        "Export cycle failed"
                    );
                    tokio::time::sleep(self.cooldown).await;
                }
            }
        }
    }

    /// One wait-reload-export cycle, returning the freshly loaded hour for
    /// the next fire-time computation
    async fn cycle(&self, upload_hour: u8, tz: Tz) -> Result<u8> {
        let now = Utc::now().with_timezone(&tz);
        let fire_at = next_fire(upload_hour, now);
        let wait = (fire_at - now).to_std().unwrap_or(MIN_SLEEP).max(MIN_SLEEP);

        tracing::info!(
            fire_at = %fire_at.to_rfc3339(),
            wait_secs = wait.as_secs(),
            "Next export scheduled"
        );
        tokio::time::sleep(wait).await;

        let options = Options::load(&self.options_path)?;
        let supervisor = SupervisorClient::from_env(self.supervisor_url.as_str())?;
        self.exporter.run_once(&options, &supervisor, tz).await?;

        tracing::info!("Scheduled export completed");
        Ok(options.upload_hour)
    }
}
