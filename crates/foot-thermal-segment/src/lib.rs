//! Foot/background segmentation of low-resolution thermal grids.
//!
//! Pipeline:
//! 1. Sample the border band of the grid and derive a scene-adaptive
//!    background threshold from its median and 10th percentile.
//! 2. Pin cold border cells to the background cluster, seed a warm cluster
//!    above a fixed buffer, and refine both with a border-biased 2-means.
//! 3. Drop foot cells with too few foot neighbours, then keep only the
//!    largest 4-connected component.
//! 4. Extract a noise-robust bounding box and the centroid of the result.
//!
//! Everything here is stateless: each grid is processed from scratch.

mod classifier;
mod cleanup;
mod geometry;
mod params;

pub use classifier::{classify, segment, segment_with_params, BorderStats, ClusterSummary};
pub use cleanup::{keep_largest_component, label_components, remove_isolated};
pub use geometry::{bounding_box, centroid};
pub use params::SegmentParams;

pub use foot_thermal_core::{BoundingBox, Centroid, FootMask, TemperatureGrid};
