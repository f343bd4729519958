//! Bounding-box relative ROI codec with side-aware mirroring.
//!
//! Rows survive normalization unchanged between feet (toe-to-heel order is
//! the same), columns do not: the medial and lateral sides swap between a
//! left and a right capture. Mirroring is therefore driven by where the
//! hallux lands, not by comparing the stored side with the current one.

use crate::calibration::RoiCalibration;
use crate::region::{NormalizedRoi, RoiRect, RoiSet};
use crate::store::{BlobStore, CalibrationStore};
use foot_thermal_core::{BoundingBox, FootSide};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Added before flooring so that `denormalize(normalize(r, b), b) == r`.
const FLOOR_GUARD: f64 = 1e-9;

/// Which mirroring pass, if any, was needed to put the hallux on the
/// expected half of the bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorCorrection {
    /// Regions were used as denormalized.
    None,
    /// Regions were reflected across the full image width.
    FullWidth,
    /// The full-width reflection left the hallux on the wrong half; regions
    /// were reflected across the bounding-box column axis instead.
    Forced,
}

/// Calibration projected onto one capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedRoiSet {
    /// Bounding box the regions were projected onto.
    pub bbox: BoundingBox,
    /// Absolute rectangles after mirroring.
    pub rects: RoiSet<RoiRect>,
    /// Row-major masks of the grid's shape, one per region.
    pub masks: RoiSet<Vec<bool>>,
    pub correction: MirrorCorrection,
}

/// Express `rect` as fractions of `bbox`'s height and width.
///
/// Each coordinate maps to `(coord - bbox_min) / (bbox_max - bbox_min + 1)`,
/// clamped into `[0, 1]`.
pub fn normalize(rect: &RoiRect, bbox: &BoundingBox) -> NormalizedRoi {
    let frac = |v: usize, lo: usize, size: usize| {
        ((v as f64 - lo as f64) / size as f64).clamp(0.0, 1.0)
    };
    let (h, w) = (bbox.height(), bbox.width());
    NormalizedRoi {
        min_row: frac(rect.min_row, bbox.min_row, h),
        max_row: frac(rect.max_row, bbox.min_row, h),
        min_col: frac(rect.min_col, bbox.min_col, w),
        max_col: frac(rect.max_col, bbox.min_col, w),
    }
}

/// Project normalized fractions back onto `bbox`.
///
/// Values are floored to whole cells and clamped into the box.
pub fn denormalize(roi: &NormalizedRoi, bbox: &BoundingBox) -> RoiRect {
    let project = |f: f64, lo: usize, hi: usize, size: usize| {
        let offset = (f * size as f64 + FLOOR_GUARD).floor();
        (lo as f64 + offset).max(lo as f64).min(hi as f64) as usize
    };
    let (h, w) = (bbox.height(), bbox.width());
    RoiRect {
        min_row: project(roi.min_row, bbox.min_row, bbox.max_row, h),
        max_row: project(roi.max_row, bbox.min_row, bbox.max_row, h),
        min_col: project(roi.min_col, bbox.min_col, bbox.max_col, w),
        max_col: project(roi.max_col, bbox.min_col, bbox.max_col, w),
    }
}

/// Half of the bounding box the hallux centre falls in.
///
/// A centre exactly on the box midline counts as the right half.
fn hallux_side(hallux: &RoiRect, bbox: &BoundingBox) -> FootSide {
    if hallux.center_col() < bbox.center_col() {
        FootSide::Left
    } else {
        FootSide::Right
    }
}

/// Project a calibration onto a capture of the given `side`.
///
/// The hallux is expected on the left half of the bounding box for a left
/// foot and on the right half for a right foot. On mismatch every region is
/// reflected across the full image width (`col -> cols - 1 - col`). If the
/// hallux is still on the wrong half, the denormalized regions are reflected
/// across the bounding-box axis instead. That second pass cannot resolve a
/// hallux centred exactly on the midline.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(calibration, side), fields(side = %side))
)]
pub fn apply_calibration(
    calibration: &RoiCalibration,
    bbox: &BoundingBox,
    rows: usize,
    cols: usize,
    side: FootSide,
) -> AppliedRoiSet {
    if calibration.metadata.foot_side != side {
        debug!(
            "applying {} calibration to a {} capture",
            calibration.metadata.foot_side, side
        );
    }

    let base = calibration.regions.map(|_, roi| denormalize(roi, bbox));
    let mut rects = base.clone();
    let mut correction = MirrorCorrection::None;

    if hallux_side(&rects.hallux, bbox) != side {
        rects = base.map(|_, r| r.mirrored(cols));
        correction = MirrorCorrection::FullWidth;

        if hallux_side(&rects.hallux, bbox) != side {
            rects = base.map(|_, r| r.mirrored_within(bbox.min_col, bbox.max_col));
            correction = MirrorCorrection::Forced;
            if hallux_side(&rects.hallux, bbox) != side {
                warn!(
                    "hallux {:?} still outside the expected {} half of {:?}",
                    rects.hallux, side, bbox
                );
            } else {
                warn!("full-width mirroring was not enough, used bounding-box mirroring");
            }
        }
    }

    let masks = rects.map(|_, r| r.to_mask(rows, cols));
    AppliedRoiSet {
        bbox: *bbox,
        rects,
        masks,
        correction,
    }
}

/// Load the calibration from `store` and project it onto a capture.
///
/// Returns `None` when no (valid) calibration is stored or when the capture
/// has no bounding box.
pub fn apply_stored_calibration<S: BlobStore>(
    store: &CalibrationStore<S>,
    bbox: Option<&BoundingBox>,
    rows: usize,
    cols: usize,
    side: FootSide,
) -> Option<AppliedRoiSet> {
    let bbox = bbox?;
    let calibration = store.load_or_none()?;
    Some(apply_calibration(&calibration, bbox, rows, cols, side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationMetadata;
    use crate::store::MemoryBlobStore;

    fn bbox(min_row: usize, max_row: usize, min_col: usize, max_col: usize) -> BoundingBox {
        BoundingBox {
            min_row,
            max_row,
            min_col,
            max_col,
        }
    }

    fn left_calibration(capture: &BoundingBox) -> RoiCalibration {
        let hallux = RoiRect::new(2, 5, 4, 6).unwrap();
        let first_met = RoiRect::new(8, 11, 4, 7).unwrap();
        let heel = RoiRect::new(24, 28, 6, 10).unwrap();
        RoiCalibration {
            regions: RoiSet {
                hallux: normalize(&hallux, capture),
                first_metatarsal: normalize(&first_met, capture),
                heel: normalize(&heel, capture),
            },
            metadata: CalibrationMetadata {
                foot_side: FootSide::Left,
                bbox_height: capture.height(),
                bbox_width: capture.width(),
            },
        }
    }

    #[test]
    fn normalize_uses_inclusive_extent() {
        let b = bbox(2, 11, 4, 8);
        let roi = normalize(&RoiRect::new(2, 11, 6, 8).unwrap(), &b);
        assert_eq!(roi.min_row, 0.0);
        assert_eq!(roi.max_row, 0.9);
        assert_eq!(roi.min_col, 0.4);
        assert_eq!(roi.max_col, 0.8);
    }

    #[test]
    fn round_trip_reproduces_every_rect_in_box() {
        let b = bbox(3, 31, 5, 19);
        for r0 in (b.min_row..=b.max_row).step_by(3) {
            for r1 in (r0..=b.max_row).step_by(4) {
                for c0 in b.min_col..=b.max_col {
                    for c1 in c0..=b.max_col {
                        let rect = RoiRect::new(r0, r1, c0, c1).unwrap();
                        assert_eq!(denormalize(&normalize(&rect, &b), &b), rect);
                    }
                }
            }
        }
    }

    #[test]
    fn denormalize_scales_to_new_box_and_clamps() {
        let roi = NormalizedRoi {
            min_row: 0.5,
            max_row: 1.0,
            min_col: 0.0,
            max_col: 0.99,
        };
        let rect = denormalize(&roi, &bbox(10, 19, 0, 3));
        assert_eq!(rect, RoiRect::new(15, 19, 0, 3).unwrap());
    }

    #[test]
    fn same_side_keeps_regions() {
        let capture = bbox(2, 29, 4, 13);
        let cal = left_calibration(&capture);
        let applied = apply_calibration(&cal, &capture, 32, 24, FootSide::Left);
        assert_eq!(applied.correction, MirrorCorrection::None);
        assert_eq!(applied.rects.hallux, RoiRect::new(2, 5, 4, 6).unwrap());
        assert_eq!(applied.masks.heel.iter().filter(|&&v| v).count(), 5 * 5);
    }

    #[test]
    fn centred_foot_is_mirrored_across_image_width() {
        // Foot centred in a 24-column frame: bbox 7..=16 mirrors onto itself.
        let capture = bbox(2, 29, 7, 16);
        let cal = left_calibration(&bbox(2, 29, 4, 13));
        let applied = apply_calibration(&cal, &capture, 32, 24, FootSide::Right);
        assert_eq!(applied.correction, MirrorCorrection::FullWidth);
        let hallux = applied.rects.hallux;
        assert!(hallux.center_col() > capture.center_col());
        assert_eq!((hallux.min_col, hallux.max_col), (14, 16));
        // rows are untouched
        assert_eq!((hallux.min_row, hallux.max_row), (2, 5));
    }

    #[test]
    fn off_centre_foot_needs_the_forced_pass() {
        let capture = bbox(2, 29, 10, 19);
        let cal = left_calibration(&bbox(2, 29, 4, 13));
        let applied = apply_calibration(&cal, &capture, 32, 24, FootSide::Right);
        assert_eq!(applied.correction, MirrorCorrection::Forced);
        let hallux = applied.rects.hallux;
        assert_eq!((hallux.min_col, hallux.max_col), (17, 19));
        assert!(hallux.center_col() > capture.center_col());
    }

    #[test]
    fn stored_calibration_requires_both_inputs() {
        let store = CalibrationStore::new(MemoryBlobStore::default());
        let capture = bbox(2, 29, 4, 13);
        assert!(apply_stored_calibration(&store, Some(&capture), 32, 24, FootSide::Left).is_none());

        store.save(&left_calibration(&capture)).unwrap();
        assert!(apply_stored_calibration(&store, None, 32, 24, FootSide::Left).is_none());
        let applied =
            apply_stored_calibration(&store, Some(&capture), 32, 24, FootSide::Left).unwrap();
        assert_eq!(applied.bbox, capture);
    }
}
