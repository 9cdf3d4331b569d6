//! trendstitch core - one consistent scale out of many relative windows
//!
//! This crate provides the stitching engine:
//! - Sparse timestamp-keyed series types
//! - Scale estimation from the overlap of two windows
//! - In-place merging with zero-value edge cases and pruning
//! - A keyword store with per-keyword exclusion
//! - Output records for emitters

pub mod series;
pub mod scale;
pub mod merge;
pub mod store;
pub mod record;

pub use series::*;
pub use scale::*;
pub use merge::*;
pub use store::*;
pub use record::*;

/// Upper bound of the data source's native per-query scale
pub const MAX_RAW_INTENSITY: Intensity = 100;
