//! Scale estimation from overlapping windows
//!
//! Each query is rescaled 0-100 on its own, so a fresh window relates to the
//! running series by an unknown multiplicative constant. The estimate is the
//! mean of `existing / incoming` over the overlap, skipping every pair with a
//! zero on either side: zero is scale-invariant and says nothing about the
//! constant.

use crate::{NormalizedSeries, RawWindow};

/// Overlap between a series and an incoming window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlap {
    /// Timestamps present in both
    pub shared: usize,
    /// Shared timestamps where both values are nonzero
    pub informative: usize,
}

impl Overlap {
    pub fn between(existing: &NormalizedSeries, incoming: &RawWindow) -> Self {
        let mut overlap = Self::default();
        for (timestamp, raw) in incoming.iter() {
            if let Some(current) = existing.get(timestamp) {
                overlap.shared += 1;
                if current != 0 && raw != 0 {
                    overlap.informative += 1;
                }
            }
        }
        overlap
    }
}

/// Mean ratio of `existing[t] / incoming[t]` over informative overlap points.
///
/// Returns exactly `0.0` when no point qualifies. That is a sentinel for
/// "no usable overlap", not a claim that the true scale is zero.
pub fn estimate_scale(existing: &NormalizedSeries, incoming: &RawWindow) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;

    for (timestamp, raw) in incoming.iter() {
        match existing.get(timestamp) {
            Some(current) if current != 0 && raw != 0 => {
                sum += f64::from(current) / f64::from(raw);
                n += 1;
            }
            _ => {}
        }
    }

    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, u32)]) -> NormalizedSeries {
        NormalizedSeries::from(&points.iter().copied().collect::<RawWindow>())
    }

    #[test]
    fn test_single_overlap_ratio() {
        let existing = series(&[(100, 50)]);
        let incoming = RawWindow::from([(100, 25), (200, 10)]);

        assert_eq!(estimate_scale(&existing, &incoming), 2.0);
    }

    #[test]
    fn test_mean_of_ratios() {
        let existing = series(&[(1, 10), (2, 30), (3, 99)]);
        let incoming = RawWindow::from([(1, 20), (2, 20), (4, 50)]);

        // (0.5 + 1.5) / 2
        assert!((estimate_scale(&existing, &incoming) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_shared_timestamps() {
        let existing = series(&[(1, 10), (2, 20)]);
        let incoming = RawWindow::from([(3, 30), (4, 40)]);

        assert_eq!(estimate_scale(&existing, &incoming), 0.0);
        assert_eq!(Overlap::between(&existing, &incoming), Overlap::default());
    }

    #[test]
    fn test_zero_pairs_are_uninformative() {
        let existing = series(&[(1, 0), (2, 40), (3, 0)]);
        let incoming = RawWindow::from([(1, 10), (2, 0), (3, 0)]);

        assert_eq!(estimate_scale(&existing, &incoming), 0.0);
        assert_eq!(
            Overlap::between(&existing, &incoming),
            Overlap { shared: 3, informative: 0 }
        );
    }

    #[test]
    fn test_zero_pairs_do_not_dilute_mean() {
        let existing = series(&[(1, 0), (2, 60)]);
        let incoming = RawWindow::from([(1, 5), (2, 20)]);

        assert_eq!(estimate_scale(&existing, &incoming), 3.0);
    }

    #[test]
    fn test_empty_existing() {
        let incoming = RawWindow::from([(1, 5)]);
        assert_eq!(estimate_scale(&NormalizedSeries::new(), &incoming), 0.0);
    }
}
