//! Border-seeded constrained 2-means classifier.
//!
//! Pure intensity thresholding breaks down when the floor is warmer towards
//! the centre of the frame. Here the clusters are seeded from the border
//! band only, the warm seed sits a fixed buffer above the background
//! threshold, and border cells are nudged towards background during
//! refinement.

use crate::cleanup::{keep_largest_component, remove_isolated};
use crate::SegmentParams;
use foot_thermal_core::{FootMask, TemperatureGrid};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Order statistics of the border band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderStats {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub p10: f32,
}

/// Diagnostics of a single classifier run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub border: BorderStats,
    pub background_threshold: f32,
    pub foot_threshold: f32,
    /// Number of border cells pinned to background.
    pub pinned: usize,
    /// Final centroids `[cold, hot]`.
    pub centroids: [f32; 2],
    /// Refinement passes actually run.
    pub iterations: usize,
    /// Cells labelled foot before noise removal.
    pub foot_cells: usize,
}

/// Two-phase cell state: pinned cells never leave the background cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellState {
    Pinned,
    Free,
}

/// Segment with default parameters.
pub fn segment(grid: &TemperatureGrid) -> FootMask {
    segment_with_params(grid, &SegmentParams::default())
}

/// Full segmentation: clustering, noise removal, largest component.
///
/// An empty grid yields an empty mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(grid, params), fields(rows = grid.rows(), cols = grid.cols()))
)]
pub fn segment_with_params(grid: &TemperatureGrid, params: &SegmentParams) -> FootMask {
    let Some((raw, summary)) = classify(grid, params) else {
        return FootMask::empty(grid.rows(), grid.cols());
    };
    debug!(
        "clusters: cold={:.2} hot={:.2} iters={} pinned={} foot={}",
        summary.centroids[0],
        summary.centroids[1],
        summary.iterations,
        summary.pinned,
        summary.foot_cells
    );

    let cleaned = remove_isolated(&raw, params.min_foot_neighbors);
    keep_largest_component(&cleaned)
}

/// Run the clustering stage only.
///
/// Returns the raw foot labelling (before noise removal) together with the
/// clustering diagnostics, or `None` for an empty grid.
pub fn classify(
    grid: &TemperatureGrid,
    params: &SegmentParams,
) -> Option<(FootMask, ClusterSummary)> {
    if grid.is_empty() {
        return None;
    }
    let rows = grid.rows();
    let cols = grid.cols();
    let temps = grid.data();
    let n = temps.len();

    let margin = params.border_margin;
    let edge: Vec<bool> = (0..n)
        .map(|i| {
            let (r, c) = (i / cols, i % cols);
            r < margin || c < margin || r + margin >= rows || c + margin >= cols
        })
        .collect();

    let edge_temps: Vec<f32> = temps
        .iter()
        .zip(&edge)
        .filter_map(|(&t, &e)| e.then_some(t))
        .collect();
    // margin == 0 leaves no border band; fall back to the whole grid.
    let border = if edge_temps.is_empty() {
        border_stats(temps)
    } else {
        border_stats(&edge_temps)
    };

    let background_threshold = border.p10 + (border.median - border.p10) * params.background_blend;
    let foot_threshold = background_threshold + params.foot_offset;

    let state: Vec<CellState> = (0..n)
        .map(|i| {
            if edge[i] && temps[i] <= background_threshold {
                CellState::Pinned
            } else {
                CellState::Free
            }
        })
        .collect();
    let pinned = state.iter().filter(|&&s| s == CellState::Pinned).count();

    let mut cold = mean_where(temps, |i| state[i] == CellState::Pinned).unwrap_or(border.median);
    let mut hot = mean_where(temps, |i| {
        state[i] == CellState::Free && temps[i] >= foot_threshold
    })
    .unwrap_or(foot_threshold);
    if (hot - cold).abs() < params.min_separation {
        cold = border.median;
        hot = border.median + params.fallback_spread;
    }

    let midpoint = (cold + hot) * 0.5;
    let mut is_hot: Vec<bool> = (0..n)
        .map(|i| state[i] == CellState::Free && temps[i] >= midpoint)
        .collect();

    let mut iterations = 0;
    for _ in 0..params.max_iters {
        iterations += 1;
        let mut changed = false;
        for i in 0..n {
            if state[i] == CellState::Pinned {
                continue;
            }
            let t = temps[i];
            let mut d_cold = (t - cold).abs();
            if edge[i] {
                d_cold -= params.edge_bias;
            }
            let d_hot = (t - hot).abs();
            let label = d_hot < d_cold;
            if is_hot[i] != label {
                is_hot[i] = label;
                changed = true;
            }
        }

        if let Some(m) = mean_where(temps, |i| !is_hot[i]) {
            cold = m;
        }
        if let Some(m) = mean_where(temps, |i| is_hot[i]) {
            hot = m;
        }

        if !changed {
            break;
        }
    }

    let foot_is_hot = hot >= cold;
    let cells: Vec<bool> = is_hot.iter().map(|&h| h == foot_is_hot).collect();
    let foot_cells = cells.iter().filter(|&&v| v).count();

    let summary = ClusterSummary {
        border,
        background_threshold,
        foot_threshold,
        pinned,
        centroids: [cold, hot],
        iterations,
        foot_cells,
    };
    Some((FootMask { rows, cols, cells }, summary))
}

/// Min, max, median and 10th percentile of a non-empty sample.
///
/// Median and percentile use the lower nearest-rank element of the sorted
/// sample (`sorted[n / 2]`, `sorted[floor(0.1 * n)]`).
fn border_stats(samples: &[f32]) -> BorderStats {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f32::total_cmp);
    let n = sorted.len();
    let p10_idx = ((n as f32 * 0.1).floor() as usize).min(n - 1);
    BorderStats {
        count: n,
        min: sorted[0],
        max: sorted[n - 1],
        median: sorted[n / 2],
        p10: sorted[p10_idx],
    }
}

fn mean_where(temps: &[f32], mut pred: impl FnMut(usize) -> bool) -> Option<f32> {
    let mut sum = 0f64;
    let mut count = 0usize;
    for (i, &t) in temps.iter().enumerate() {
        if pred(i) {
            sum += t as f64;
            count += 1;
        }
    }
    (count > 0).then(|| (sum / count as f64) as f32)
}
