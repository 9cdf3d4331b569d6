//! Explore request
//!
//! The API does not serve interest data directly: an explore call returns a
//! set of widgets, each carrying a signed request and token. The time-series
//! widget is then fed to the multiline endpoint.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{strip_guard, TrendsClient, TrendsConfig, TrendsError};

/// Widget id of the interest-over-time widget
pub const TIMESERIES_WIDGET: &str = "TIMESERIES";

/// A widget descriptor from an explore response
#[derive(Debug, Clone, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub token: String,
    /// Opaque request payload, echoed back to the widget endpoint
    pub request: Value,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

/// Build the `req` parameter of an explore call
pub fn build_explore_request(keyword: &str, config: &TrendsConfig) -> String {
    json!({
        "comparisonItem": [{
            "keyword": keyword,
            "geo": config.geo,
            "time": config.timeframe,
        }],
        "category": config.category,
        "property": "",
    })
    .to_string()
}

/// Parse the widgets of an explore response body
pub fn parse_explore(body: &str) -> Result<Vec<Widget>, TrendsError> {
    let response: ExploreResponse =
        serde_json::from_str(strip_guard(body)).map_err(|e| TrendsError::Parse(e.to_string()))?;
    Ok(response.widgets)
}

/// Pick the time-series widget
pub fn find_timeseries(widgets: Vec<Widget>, keyword: &str) -> Result<Widget, TrendsError> {
    widgets
        .into_iter()
        .find(|w| w.id == TIMESERIES_WIDGET)
        .ok_or_else(|| TrendsError::MissingWidget(keyword.to_string()))
}

impl TrendsClient {
    /// Run an explore call and return the keyword's time-series widget
    pub async fn explore(&self, keyword: &str) -> Result<Widget, TrendsError> {
        let url = self.endpoint("/trends/api/explore");
        let mut params = self.common_params();
        params.push(("req", build_explore_request(keyword, self.config())));

        debug!("Exploring widgets for: {}", keyword);

        let body = self.get_text(&url, &params).await?;
        let widgets = parse_explore(&body)?;
        debug!("Explore for '{}' returned {} widgets", keyword, widgets.len());

        find_timeseries(widgets, keyword)
    }
}
