//! Core types and utilities for thermal foot analysis.
//!
//! This crate is intentionally small. It defines the temperature grid, the
//! boolean foot mask and the geometric primitives (bounding box, centroid)
//! shared by the segmentation and ROI crates. It does *not* depend on any
//! image decoding or storage backend.

mod grid;
mod mask;
mod side;

pub use grid::{GridError, TemperatureGrid};
pub use mask::{BoundingBox, Centroid, FootMask};
pub use side::FootSide;
