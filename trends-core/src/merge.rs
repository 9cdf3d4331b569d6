//! Window merging
//!
//! Folds a freshly fetched, independently scaled window into the running
//! series for a keyword:
//! - the first window defines the baseline scale and is copied as-is
//! - later windows are rescaled by the overlap estimate
//! - points already known as nonzero are never revised
//! - points known as zero are superseded by nonzero evidence
//! - the series is pruned to the incoming window's timestamps

use std::collections::btree_map::Entry;

use crate::{estimate_scale, Intensity, NormalizedSeries, Overlap, RawWindow};

/// How a window was folded in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// Series was empty; the window became the baseline
    Baseline,
    /// A scale could be estimated from the overlap
    Scaled,
    /// No informative overlap; scale fell back to the zero sentinel
    Unscaled,
}

/// Outcome of a single merge, for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeReport {
    pub kind: MergeKind,
    pub scale: f64,
    pub overlap: Overlap,
    /// New timestamps added
    pub inserted: usize,
    /// Zero points replaced by a scaled value
    pub revised: usize,
    /// Zero points replaced by the raw value because no scale was available
    pub fallback: usize,
    /// Points dropped because they fell out of the window
    pub pruned: usize,
}

impl MergeReport {
    fn new(kind: MergeKind, scale: f64, overlap: Overlap) -> Self {
        Self {
            kind,
            scale,
            overlap,
            inserted: 0,
            revised: 0,
            fallback: 0,
            pruned: 0,
        }
    }
}

/// Round half away from zero, saturating into the intensity range
fn rescale(raw: Intensity, scale: f64) -> Intensity {
    (f64::from(raw) * scale).round() as Intensity
}

/// Merge `incoming` into `existing` in place.
///
/// Afterwards the key set of `existing` equals the key set of `incoming`.
/// There is no failure path: an empty window simply empties the series.
pub fn merge(existing: &mut NormalizedSeries, incoming: &RawWindow) -> MergeReport {
    if existing.is_empty() {
        *existing = NormalizedSeries::from(incoming);
        let mut report = MergeReport::new(MergeKind::Baseline, 1.0, Overlap::default());
        report.inserted = incoming.len();
        return report;
    }

    let overlap = Overlap::between(existing, incoming);
    let scale = estimate_scale(existing, incoming);
    let kind = if scale == 0.0 {
        MergeKind::Unscaled
    } else {
        MergeKind::Scaled
    };
    let mut report = MergeReport::new(kind, scale, overlap);

    for (timestamp, raw) in incoming.iter() {
        let normalized = rescale(raw, scale);

        match existing.entry(timestamp) {
            Entry::Occupied(mut slot) => {
                if *slot.get() != 0 || raw == 0 {
                    continue;
                }
                if scale != 0.0 {
                    *slot.get_mut() = normalized;
                    report.revised += 1;
                } else {
                    // Breaks scale consistency for this point; kept as a known approximation.
                    *slot.get_mut() = raw;
                    report.fallback += 1;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(normalized);
                report.inserted += 1;
            }
        }
    }

    report.pruned = existing.retain(|timestamp| incoming.contains(timestamp));
    report
}
