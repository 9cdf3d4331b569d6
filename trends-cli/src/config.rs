//! Optional TOML configuration file
//!
//! ```toml
//! keywords = ["rust lang", "zig"]
//! poll_interval_secs = 600
//!
//! [client]
//! geo = "GB"
//! timeframe = "now 4-H"
//! ```
//!
//! Command-line flags override anything set here.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use trends_client::TrendsConfig;

/// Contents of a configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub keywords: Vec<String>,
    pub poll_interval_secs: u64,
    pub query_delay_ms: u64,
    pub max_rounds: u64,
    pub max_concurrent: usize,
    pub emit_utc: bool,
    pub client: TrendsConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            poll_interval_secs: 600,
            query_delay_ms: 1000,
            max_rounds: 0,
            max_concurrent: 1,
            emit_utc: false,
            client: TrendsConfig::default(),
        }
    }
}

impl FileConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}
