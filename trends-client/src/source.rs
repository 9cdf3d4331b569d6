//! Window source abstraction
//!
//! The driver only needs "give me the newest window for this keyword".
//! [`GoogleTrendsSource`] is the production implementation; tests plug in
//! their own.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use trends_core::RawWindow;

use crate::{TrendsClient, TrendsConfig, TrendsError};

/// Something that can fetch the newest relative window for a keyword
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// Fetch one window. Failures must surface as errors, not as zero readings.
    async fn fetch_window(&self, keyword: &str) -> Result<RawWindow, TrendsError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Shared, type-erased window source
pub type SharedSource = Arc<dyn WindowSource>;

/// Google Trends backed window source
pub struct GoogleTrendsSource {
    client: TrendsClient,
}

impl GoogleTrendsSource {
    pub fn new(config: TrendsConfig) -> Result<Self, TrendsError> {
        Ok(Self {
            client: TrendsClient::new(config)?,
        })
    }

    pub fn config(&self) -> &TrendsConfig {
        self.client.config()
    }
}

#[async_trait]
impl WindowSource for GoogleTrendsSource {
    async fn fetch_window(&self, keyword: &str) -> Result<RawWindow, TrendsError> {
        let widget = self.client.explore(keyword).await?;
        debug!("Using widget '{}' for '{}'", widget.title, keyword);
        self.client.interest_over_time(&widget, keyword).await
    }

    fn name(&self) -> &str {
        "google-trends"
    }
}

/// Create a shared Google Trends source
pub fn create_source(config: TrendsConfig) -> Result<SharedSource, TrendsError> {
    Ok(Arc::new(GoogleTrendsSource::new(config)?))
}
