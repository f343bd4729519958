//! High-level facade crate for the `foot-thermal-*` workspace.
//!
//! This crate provides:
//! - re-exports of the segmentation and ROI crates
//! - the JSON frame payload delivered by the acquisition side
//! - end-to-end helpers: frame -> foot mask -> bounding box -> applied ROIs
//!   -> per-region statistics, and left/right asymmetry comparison
//! - (feature `image`) a simulated sensor producing frames from a grayscale
//!   foot picture
//!
//! ## Quickstart
//!
//! ```no_run
//! use foot_thermal::{analyze, FootSide, ThermalFrame};
//! use foot_thermal::roi::{CalibrationStore, DirBlobStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = ThermalFrame::load_json("frame.json")?;
//! let grid = frame.to_grid()?;
//! let store = CalibrationStore::new(DirBlobStore::new("calibration"));
//! let report = analyze::analyze_with_store(&grid, FootSide::Left, &store, &Default::default());
//! println!("hallux: {:?}", report.stats.hallux);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `foot_thermal::core`: grid, mask, bounding box, centroid, foot side.
//! - `foot_thermal::segment`: foot/background classifier and geometry.
//! - `foot_thermal::roi`: calibration, codec, statistics, persistence.
//! - `foot_thermal::analyze`: end-to-end pipeline and reports.
//! - `foot_thermal::simulate` (feature `image`): synthetic frame source.

pub use foot_thermal_core as core;
pub use foot_thermal_roi as roi;
pub use foot_thermal_segment as segment;

pub use foot_thermal_core::{BoundingBox, Centroid, FootMask, FootSide, TemperatureGrid};

pub mod analyze;
pub mod compare;
mod frame;

#[cfg(feature = "image")]
pub mod simulate;

pub use frame::{FrameIoError, SimulationMode, ThermalFrame};
