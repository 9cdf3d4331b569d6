//! Keyword store - owns one normalized series per tracked keyword
//!
//! The key set is fixed at construction. Each series sits behind its own
//! lock, so merges for one keyword are serialized while different keywords
//! proceed independently.

use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::{merge, MergeReport, NormalizedSeries, RawWindow, SeriesPoint};

/// Errors from the keyword store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),
}

/// Per-keyword series, shared across the driver as `Arc<KeywordStore>`
#[derive(Debug, Default)]
pub struct KeywordStore {
    /// Registration order, used for deterministic iteration
    keywords: Vec<String>,
    series: HashMap<String, Mutex<NormalizedSeries>>,
}

impl KeywordStore {
    /// Register every keyword with an empty series. Duplicates collapse.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::default();
        for keyword in keywords {
            let keyword = keyword.into();
            if store.series.contains_key(&keyword) {
                continue;
            }
            store
                .series
                .insert(keyword.clone(), Mutex::new(NormalizedSeries::new()));
            store.keywords.push(keyword);
        }
        store
    }

    /// Registered keywords in registration order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.series.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Lock the series for a keyword. Holding the guard excludes other merges for it.
    pub fn get(&self, keyword: &str) -> Result<MutexGuard<'_, NormalizedSeries>, StoreError> {
        self.series
            .get(keyword)
            .map(|series| series.lock())
            .ok_or_else(|| StoreError::UnknownKeyword(keyword.to_string()))
    }

    /// Merge a fetched window into the keyword's series
    pub fn merge(&self, keyword: &str, incoming: &RawWindow) -> Result<MergeReport, StoreError> {
        let mut series = self.get(keyword)?;
        Ok(merge(&mut series, incoming))
    }

    /// Ascending-by-timestamp copy of the keyword's series
    pub fn snapshot_sorted(&self, keyword: &str) -> Result<Vec<SeriesPoint>, StoreError> {
        Ok(self.get(keyword)?.to_sorted_vec())
    }
}
