//! Interest-over-time widget data
//!
//! Parses the multiline endpoint into a validated [`RawWindow`]. A fetch that
//! cannot be read is an error, never a window of zeros.

use serde::Deserialize;
use tracing::debug;

use trends_core::{Intensity, RawWindow, Timestamp, MAX_RAW_INTENSITY};

use crate::{strip_guard, TrendsClient, TrendsError, Widget};

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: TimelineBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineBody {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    /// Epoch seconds as a decimal string
    time: String,
    #[serde(default)]
    value: Vec<i64>,
}

/// Parse a multiline response body into a raw window
pub fn parse_timeline(body: &str, keyword: &str) -> Result<RawWindow, TrendsError> {
    let response: MultilineResponse =
        serde_json::from_str(strip_guard(body)).map_err(|e| TrendsError::Parse(e.to_string()))?;

    let mut window = RawWindow::new();
    for point in response.default.timeline_data {
        let timestamp: Timestamp = point
            .time
            .trim()
            .parse()
            .map_err(|_| TrendsError::Parse(format!("non-numeric timestamp '{}'", point.time)))?;

        let value = *point
            .value
            .first()
            .ok_or_else(|| TrendsError::Parse(format!("no value at {}", timestamp)))?;

        if !(0..=i64::from(MAX_RAW_INTENSITY)).contains(&value) {
            return Err(TrendsError::InvalidSample { timestamp, value });
        }

        window.insert(timestamp, value as Intensity);
    }

    if window.is_empty() {
        return Err(TrendsError::EmptyWindow(keyword.to_string()));
    }

    Ok(window)
}

impl TrendsClient {
    /// Fetch the interest-over-time data behind a time-series widget
    pub async fn interest_over_time(
        &self,
        widget: &Widget,
        keyword: &str,
    ) -> Result<RawWindow, TrendsError> {
        let url = self.endpoint("/trends/api/widgetdata/multiline");
        let mut params = self.common_params();
        params.push(("req", widget.request.to_string()));
        params.push(("token", widget.token.clone()));

        let body = self.get_text(&url, &params).await?;
        let window = parse_timeline(&body, keyword)?;

        debug!("Fetched {} samples for '{}'", window.len(), keyword);
        Ok(window)
    }
}
