//! Timestamp-keyed series
//!
//! Both the transient result of one query ([`RawWindow`]) and the running
//! estimate for a keyword ([`NormalizedSeries`]) are sparse maps keyed by
//! epoch seconds. The source may skip or repeat boundary timestamps between
//! queries, so neither is treated as a fixed grid.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch
pub type Timestamp = i64;

/// Search interest. Raw values are 0-100 per query; merged values are unbounded above.
pub type Intensity = u32;

/// One query's result for one keyword
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWindow {
    samples: BTreeMap<Timestamp, Intensity>,
}

impl RawWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample; a repeated timestamp keeps the latest value
    pub fn insert(&mut self, timestamp: Timestamp, value: Intensity) {
        self.samples.insert(timestamp, value);
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<Intensity> {
        self.samples.get(&timestamp).copied()
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.samples.contains_key(&timestamp)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in ascending timestamp order
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Intensity)> + '_ {
        self.samples.iter().map(|(t, v)| (*t, *v))
    }

    /// Earliest and latest timestamp covered
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.samples.keys().next()?;
        let last = self.samples.keys().next_back()?;
        Some((*first, *last))
    }
}

impl FromIterator<(Timestamp, Intensity)> for RawWindow {
    fn from_iter<I: IntoIterator<Item = (Timestamp, Intensity)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(Timestamp, Intensity); N]> for RawWindow {
    fn from(samples: [(Timestamp, Intensity); N]) -> Self {
        samples.into_iter().collect()
    }
}

/// A single point of an ordered snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: Timestamp,
    pub value: Intensity,
}

/// Running estimate for one keyword, on a single consistent scale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    points: BTreeMap<Timestamp, Intensity>,
}

impl NormalizedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<Intensity> {
        self.points.get(&timestamp).copied()
    }

    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.points.contains_key(&timestamp)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Intensity)> + '_ {
        self.points.iter().map(|(t, v)| (*t, *v))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.points.keys().copied()
    }

    /// Ascending-by-timestamp copy for output
    pub fn to_sorted_vec(&self) -> Vec<SeriesPoint> {
        self.iter()
            .map(|(timestamp, value)| SeriesPoint { timestamp, value })
            .collect()
    }

    pub(crate) fn entry(&mut self, timestamp: Timestamp) -> btree_map::Entry<'_, Timestamp, Intensity> {
        self.points.entry(timestamp)
    }

    /// Drop every point the predicate rejects, returning how many were removed
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(Timestamp) -> bool,
    {
        let before = self.points.len();
        self.points.retain(|t, _| keep(*t));
        before - self.points.len()
    }
}

impl From<&RawWindow> for NormalizedSeries {
    fn from(window: &RawWindow) -> Self {
        Self {
            points: window.samples.clone(),
        }
    }
}
