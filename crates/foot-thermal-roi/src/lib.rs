//! Anatomical ROI calibration for thermal foot captures.
//!
//! An operator draws three rectangles (hallux, first metatarsal, heel) once.
//! They are stored as fractions of the foot bounding box, which makes them
//! reusable across captures of different size and position. When applied to
//! a capture of the other foot, the column placement is mirrored, driven by
//! where the hallux lands relative to the new bounding box.
//!
//! - [`region`]: region kinds, absolute and normalized rectangles.
//! - [`CalibrationSession`]: operator selection workflow.
//! - [`normalize`] / [`denormalize`] / [`apply_calibration`]: the codec.
//! - [`roi_stats`]: per-region temperature statistics.
//! - [`CalibrationStore`]: persistence through an injected [`BlobStore`].

mod calibration;
mod codec;
pub mod region;
mod stats;
mod store;

pub use calibration::{
    CalibrationError, CalibrationMetadata, CalibrationSession, RoiCalibration,
};
pub use codec::{
    apply_calibration, apply_stored_calibration, denormalize, normalize, AppliedRoiSet,
    MirrorCorrection,
};
pub use region::{NormalizedRoi, RoiKind, RoiRect, RoiSet};
pub use stats::{region_stats, roi_stats, RoiStatistics};
pub use store::{
    BlobStore, CalibrationStore, DirBlobStore, MemoryBlobStore, StoreError, CALIBRATION_KEY,
};
