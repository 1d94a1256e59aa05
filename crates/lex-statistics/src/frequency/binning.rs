//! Adaptive bin-count selection for grouped frequency tables.
//!
//! Four classic rules propose a bin count; the median of the proposals that
//! fall inside the configured range wins. The resulting width is then
//! rounded up to a clean value and the count recomputed from it.

use tracing::debug;

use crate::types::{BinSelection, Interval};
use crate::utils::{quantile_sorted, sample_std};

/// Padding added to the maximum so the last half-open bin includes it.
pub const LAST_EDGE_PADDING: f64 = 0.0001;

/// Bounds on the candidate bin counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinLimits {
    pub min_bins: usize,
    pub max_bins: usize,
    pub fallback_max_bins: usize,
}

impl Default for BinLimits {
    fn default() -> Self {
        Self {
            min_bins: 5,
            max_bins: 30,
            fallback_max_bins: 20,
        }
    }
}

/// The bins chosen for a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPlan {
    pub selection: BinSelection,
    pub intervals: Vec<Interval>,
}

/// Candidate counts from the four rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidates {
    sturges: usize,
    rice: usize,
    scott: usize,
    freedman_diaconis: usize,
}

/// Plan the bins for `sorted` (ascending, non-empty) values.
pub fn plan_bins(sorted: &[f64], limits: BinLimits) -> Option<BinPlan> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let n = sorted.len();
    let candidates = candidate_counts(sorted);

    if max == min {
        return Some(single_value_plan(min, candidates));
    }

    let chosen = reconcile(candidates, n, limits);
    let range = max - min;
    let width = clean_width(range / chosen as f64);
    let bins = ((range / width).ceil() as usize).max(1);

    let mut edges: Vec<f64> = (0..=bins).map(|i| min + i as f64 * width).collect();
    let last_edge = padded_max(max);
    // Float error can leave the second-to-last edge at or past the padded max
    while edges.len() > 2 && edges[edges.len() - 2] >= last_edge {
        edges.remove(edges.len() - 2);
    }
    if let Some(last) = edges.last_mut() {
        *last = last_edge;
    }

    let intervals: Vec<Interval> = edges.windows(2).map(|w| Interval::new(w[0], w[1])).collect();

    debug!(
        n,
        sturges = candidates.sturges,
        rice = candidates.rice,
        scott = candidates.scott,
        freedman_diaconis = candidates.freedman_diaconis,
        chosen,
        width,
        bins = intervals.len(),
        "Selected bins"
    );

    Some(BinPlan {
        selection: BinSelection {
            sturges: candidates.sturges,
            rice: candidates.rice,
            scott: candidates.scott,
            freedman_diaconis: candidates.freedman_diaconis,
            chosen,
            width,
            bins: intervals.len(),
        },
        intervals,
    })
}

/// Index of the interval containing `value`, for edges built by [`plan_bins`].
pub fn bin_index(intervals: &[Interval], value: f64) -> Option<usize> {
    let idx = intervals.partition_point(|interval| interval.upper <= value);
    intervals
        .get(idx)
        .filter(|interval| interval.contains(value))
        .map(|_| idx)
}

fn candidate_counts(sorted: &[f64]) -> Candidates {
    let n = sorted.len() as f64;
    let range = sorted[sorted.len() - 1] - sorted[0];
    let cube_root = n.cbrt();

    let sturges = (1.0 + 3.322 * n.log10()).ceil() as usize;
    let rice = (2.0 * cube_root).ceil() as usize;

    let scott_width = 3.5 * sample_std(sorted).unwrap_or(0.0) / cube_root;
    let scott = count_for_width(range, scott_width).unwrap_or(sturges);

    let iqr = match (quantile_sorted(sorted, 0.75), quantile_sorted(sorted, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let fd_width = if iqr > 0.0 {
        2.0 * iqr / cube_root
    } else {
        scott_width
    };
    let freedman_diaconis = count_for_width(range, fd_width).unwrap_or(sturges);

    Candidates {
        sturges,
        rice,
        scott,
        freedman_diaconis,
    }
}

fn count_for_width(range: f64, width: f64) -> Option<usize> {
    (width > 0.0 && width.is_finite()).then(|| (range / width).ceil() as usize)
}

/// Median of the in-range candidates, else the clamped Sturges count; capped
/// at `floor(sqrt(n))` for small samples.
fn reconcile(candidates: Candidates, n: usize, limits: BinLimits) -> usize {
    let mut accepted: Vec<usize> = [
        candidates.sturges,
        candidates.rice,
        candidates.scott,
        candidates.freedman_diaconis,
    ]
    .into_iter()
    .filter(|k| (limits.min_bins..=limits.max_bins).contains(k))
    .collect();
    accepted.sort_unstable();

    let mut count = if accepted.is_empty() {
        candidates
            .sturges
            .clamp(limits.min_bins, limits.fallback_max_bins)
    } else {
        let mid = accepted.len() / 2;
        if accepted.len() % 2 == 0 {
            // Truncated mean of the two middle values
            (accepted[mid - 1] + accepted[mid]) / 2
        } else {
            accepted[mid]
        }
    };

    if n < 30 {
        count = count.min((n as f64).sqrt().floor() as usize);
    }
    count.max(1)
}

/// Round `width` up to the next multiple of its power-of-ten magnitude.
fn clean_width(width: f64) -> f64 {
    let magnitude = 10f64.powf(width.log10().floor());
    let rounded = (width / magnitude).ceil() * magnitude;
    if rounded > 0.0 && rounded.is_finite() {
        rounded
    } else {
        width
    }
}

fn padded_max(max: f64) -> f64 {
    let padded = max + LAST_EDGE_PADDING;
    if padded > max {
        padded
    } else {
        max + max.abs() * 1e-12
    }
}

/// One bin centred on `value`, as narrow as the last-edge padding.
fn single_value_plan(value: f64, candidates: Candidates) -> BinPlan {
    let half = padded_max(value) - value;
    BinPlan {
        selection: BinSelection {
            sturges: candidates.sturges,
            rice: candidates.rice,
            scott: candidates.scott,
            freedman_diaconis: candidates.freedman_diaconis,
            chosen: 1,
            width: 2.0 * half,
            bins: 1,
        },
        intervals: vec![Interval::new(value - half, value + half)],
    }
}
