//! Output records for emitters

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::{Intensity, SeriesPoint, Timestamp};

/// One emitted point of a keyword's normalized series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub keyword: String,
    pub timestamp: Timestamp,
    pub value: Intensity,
    /// RFC 3339 rendering of `timestamp`, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc: Option<String>,
}

impl TrendRecord {
    pub fn new(keyword: &str, point: SeriesPoint) -> Self {
        Self {
            keyword: keyword.to_string(),
            timestamp: point.timestamp,
            value: point.value,
            utc: None,
        }
    }

    /// Attach a human-readable UTC time
    pub fn with_utc(mut self) -> Self {
        self.utc = format_utc(self.timestamp);
        self
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Build records for a whole snapshot
pub fn records_for(keyword: &str, snapshot: &[SeriesPoint], with_utc: bool) -> Vec<TrendRecord> {
    snapshot
        .iter()
        .map(|point| {
            let record = TrendRecord::new(keyword, *point);
            if with_utc {
                record.with_utc()
            } else {
                record
            }
        })
        .collect()
}

/// RFC 3339 UTC time for an epoch second, `None` if out of range
pub fn format_utc(timestamp: Timestamp) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
