use serde::{Deserialize, Serialize};

/// Parameters of the foot/background classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Width (in cells) of the border band used to sample background.
    pub border_margin: usize,
    /// Position of the background threshold between p10 and the median
    /// of the border band (0 = p10, 1 = median).
    pub background_blend: f32,
    /// Warm-side buffer above the background threshold used to seed the
    /// foot centroid, in °C.
    pub foot_offset: f32,
    /// Minimal distance between the two initial centroids, in °C.
    pub min_separation: f32,
    /// Spread used to re-seed the warm centroid above the border median
    /// when the initial centroids are too close, in °C.
    pub fallback_spread: f32,
    /// Subtracted from the background distance of border-band cells during
    /// refinement, in °C.
    pub edge_bias: f32,
    /// Max refinement passes.
    pub max_iters: usize,
    /// Interior foot cells with fewer foot 8-neighbours become background.
    pub min_foot_neighbors: usize,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            border_margin: 2,
            background_blend: 0.5,
            foot_offset: 2.0,
            min_separation: 1.5,
            fallback_spread: 3.0,
            edge_bias: 0.5,
            max_iters: 20,
            min_foot_neighbors: 2,
        }
    }
}
