//! trendstitch runtime
//!
//! Periodically fetches a window per keyword, merges it into the keyword's
//! normalized series and emits the result.

pub mod emit;
pub mod poller;

pub use emit::*;
pub use poller::*;
