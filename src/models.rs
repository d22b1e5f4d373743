//! Core data structures for the export pipeline

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Identifier stamped into every envelope so the destination can tell this
/// feed apart from other producers
pub const SOURCE_TAG: &str = "home_assistant_history_bulk_exporter";

/// History window, both ends in the controller's timezone
///
/// Recomputed for every run and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeWindow {
    /// Window covering exactly `days` days up to `end`
    pub fn lookback(end: DateTime<Tz>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }
}

/// Metadata accompanying one history payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMeta {
    pub generated_at: String,
    pub window_start: String,
    pub window_end: String,
    pub history_days: u32,
    pub source: String,
}

/// The JSON document delivered to the destination
///
/// Built fresh per run, immutable once constructed, discarded after the
/// upload attempt completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub meta: ExportMeta,
    pub history: serde_json::Value,
}

impl ExportEnvelope {
    /// Build an envelope for a window and its raw history payload
    pub fn new(window: &TimeWindow, history_days: u32, history: serde_json::Value) -> Self {
        Self {
            meta: ExportMeta {
                generated_at: window.end.to_rfc3339(),
                window_start: window.start.to_rfc3339(),
                window_end: window.end.to_rfc3339(),
                history_days,
                source: SOURCE_TAG.to_string(),
            },
            history,
        }
    }
}
