//! trendstitch data-source client
//!
//! Fetches relative interest windows from Google Trends:
//! - HTTP client with proxy, cookie store and rate-limit retries
//! - Explore request to obtain the time-series widget
//! - Multiline widget data parsed into a validated raw window

pub mod client;
pub mod explore;
pub mod timeline;
pub mod source;

pub use client::*;
pub use explore::*;
pub use timeline::*;
pub use source::*;
