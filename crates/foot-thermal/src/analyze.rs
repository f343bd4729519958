//! End-to-end pipeline: grid -> foot mask -> geometry -> applied ROIs -> stats.
//!
//! Every call works on one grid in isolation. The only shared state is the
//! calibration, read through a [`CalibrationStore`].

use crate::compare::DEFAULT_ASYMMETRY_THRESHOLD;
use crate::frame::{FrameIoError, ThermalFrame};
use foot_thermal_core::{BoundingBox, Centroid, FootMask, FootSide, GridError, TemperatureGrid};
use foot_thermal_roi::{
    apply_calibration, region_stats, BlobStore, CalibrationError, CalibrationSession,
    CalibrationStore, MirrorCorrection, RoiCalibration, RoiKind, RoiRect, RoiSet, RoiStatistics,
    StoreError,
};
use foot_thermal_segment::{bounding_box, centroid, segment_with_params, SegmentParams};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] FrameIoError),
    #[error("no foot found in the frame")]
    NoFoot,
}

fn default_asymmetry_threshold() -> f32 {
    DEFAULT_ASYMMETRY_THRESHOLD
}

/// Tunables for the whole pipeline, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    #[serde(default)]
    pub segment: SegmentParams,
    /// Average-temperature difference above which a region is flagged, °C.
    #[serde(default = "default_asymmetry_threshold")]
    pub asymmetry_threshold: f32,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            segment: SegmentParams::default(),
            asymmetry_threshold: DEFAULT_ASYMMETRY_THRESHOLD,
        }
    }
}

impl AnalyzeConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FrameIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FrameIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Read a frame file and validate it into a grid.
///
/// Also returns the foot side recorded in the payload, if any.
pub fn load_frame(path: impl AsRef<Path>) -> Result<(TemperatureGrid, Option<FootSide>), AnalyzeError> {
    let frame = ThermalFrame::load_json(path)?;
    let side = frame.foot;
    Ok((frame.into_grid()?, side))
}

/// Foot mask plus the geometry derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub mask: FootMask,
    pub bbox: Option<BoundingBox>,
    pub centroid: Option<Centroid>,
}

impl Segmentation {
    pub fn foot_cells(&self) -> usize {
        self.mask.count()
    }
}

/// Segment `grid` and extract its geometry.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(grid, params), fields(rows = grid.rows(), cols = grid.cols()))
)]
pub fn segment_grid(grid: &TemperatureGrid, params: &SegmentParams) -> Segmentation {
    let mask = segment_with_params(grid, params);
    let bbox = bounding_box(&mask);
    let centroid = centroid(&mask);
    debug!(
        "segmented {} foot cells, bbox={:?}, centroid={:?}",
        mask.count(),
        bbox,
        centroid
    );
    Segmentation {
        mask,
        bbox,
        centroid,
    }
}

/// Per-capture analysis result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootReport {
    pub side: FootSide,
    pub foot_cells: usize,
    pub bbox: Option<BoundingBox>,
    pub centroid: Option<Centroid>,
    /// Absolute regions, present when a calibration was applied.
    pub regions: Option<RoiSet<RoiRect>>,
    pub correction: Option<MirrorCorrection>,
    pub stats: RoiSet<Option<RoiStatistics>>,
}

/// Analyze one capture against an optional calibration.
///
/// Without a calibration, or when the grid holds no foot, the report carries
/// geometry only and every region statistic is `None`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(grid, calibration, params), fields(side = %side))
)]
pub fn analyze_grid(
    grid: &TemperatureGrid,
    side: FootSide,
    calibration: Option<&RoiCalibration>,
    params: &SegmentParams,
) -> FootReport {
    let seg = segment_grid(grid, params);
    let applied = match (calibration, seg.bbox.as_ref()) {
        (Some(cal), Some(bbox)) => Some(apply_calibration(cal, bbox, grid.rows(), grid.cols(), side)),
        _ => None,
    };

    let stats = applied
        .as_ref()
        .map(|a| region_stats(grid, a, &seg.mask))
        .unwrap_or_default();

    FootReport {
        side,
        foot_cells: seg.foot_cells(),
        bbox: seg.bbox,
        centroid: seg.centroid,
        regions: applied.as_ref().map(|a| a.rects.clone()),
        correction: applied.as_ref().map(|a| a.correction),
        stats,
    }
}

/// [`analyze_grid`] with the calibration read from `store`.
///
/// A missing or malformed stored calibration reads as "no calibration".
pub fn analyze_with_store<S: BlobStore>(
    grid: &TemperatureGrid,
    side: FootSide,
    store: &CalibrationStore<S>,
    params: &SegmentParams,
) -> FootReport {
    let calibration = store.load_or_none();
    analyze_grid(grid, side, calibration.as_ref(), params)
}

/// Build a calibration from operator selections on one capture.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(grid, selections, params), fields(side = %side))
)]
pub fn calibrate_grid(
    grid: &TemperatureGrid,
    side: FootSide,
    selections: &RoiSet<RoiRect>,
    params: &SegmentParams,
) -> Result<RoiCalibration, AnalyzeError> {
    let seg = segment_grid(grid, params);
    let bbox = seg.bbox.ok_or(AnalyzeError::NoFoot)?;

    let mut session = CalibrationSession::new(&seg.mask, bbox, side);
    for kind in RoiKind::ALL {
        session.select(kind, *selections.get(kind))?;
    }
    let calibration = session.finish()?;
    info!(
        "calibrated {} foot on a {}x{} bounding box",
        side,
        bbox.height(),
        bbox.width()
    );
    Ok(calibration)
}

/// [`calibrate_grid`] followed by persisting the result.
pub fn calibrate_and_store<S: BlobStore>(
    grid: &TemperatureGrid,
    side: FootSide,
    selections: &RoiSet<RoiRect>,
    params: &SegmentParams,
    store: &CalibrationStore<S>,
) -> Result<RoiCalibration, AnalyzeError> {
    let calibration = calibrate_grid(grid, side, selections, params)?;
    store.save(&calibration)?;
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foot_thermal_roi::MemoryBlobStore;

    fn square_foot() -> TemperatureGrid {
        TemperatureGrid::from_fn(12, 12, |r, c| {
            if (2..10).contains(&r) && (3..9).contains(&c) {
                34.0
            } else {
                28.0
            }
        })
    }

    fn selections() -> RoiSet<RoiRect> {
        RoiSet {
            hallux: RoiRect::new(2, 3, 3, 4).unwrap(),
            first_metatarsal: RoiRect::new(4, 5, 3, 5).unwrap(),
            heel: RoiRect::new(8, 9, 4, 7).unwrap(),
        }
    }

    #[test]
    fn report_without_calibration_has_geometry_only() {
        let report = analyze_grid(&square_foot(), FootSide::Left, None, &SegmentParams::default());
        assert_eq!(report.foot_cells, 48);
        assert_eq!(
            report.bbox,
            Some(BoundingBox {
                min_row: 2,
                max_row: 9,
                min_col: 3,
                max_col: 8
            })
        );
        assert!(report.regions.is_none());
        assert!(report.stats.iter().all(|(_, s)| s.is_none()));
    }

    #[test]
    fn calibrate_then_analyze_same_capture() {
        let grid = square_foot();
        let params = SegmentParams::default();
        let store = CalibrationStore::new(MemoryBlobStore::default());
        let cal = calibrate_and_store(&grid, FootSide::Left, &selections(), &params, &store).unwrap();
        assert_eq!(cal.metadata.bbox_height, 8);
        assert_eq!(cal.metadata.bbox_width, 6);

        let report = analyze_with_store(&grid, FootSide::Left, &store, &params);
        assert_eq!(report.correction, Some(MirrorCorrection::None));
        assert_eq!(report.regions.as_ref().map(|r| r.hallux), Some(selections().hallux));
        let heel = report.stats.heel.unwrap();
        assert_eq!(heel.count, 8);
        assert_eq!(heel.avg, 34.0);
    }

    #[test]
    fn calibration_needs_a_foot() {
        let grid = TemperatureGrid::filled(12, 12, 30.0);
        let err = calibrate_grid(&grid, FootSide::Left, &selections(), &SegmentParams::default())
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::NoFoot));
    }

    #[test]
    fn selection_off_the_foot_is_rejected() {
        let mut sel = selections();
        sel.heel = RoiRect::new(0, 1, 0, 1).unwrap();
        let err = calibrate_grid(&square_foot(), FootSide::Left, &sel, &SegmentParams::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Calibration(CalibrationError::NotOnFoot {
                kind: RoiKind::Heel
            })
        ));
    }

    #[test]
    fn load_frame_reports_io_and_shape_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_frame(dir.path().join("absent.json")),
            Err(AnalyzeError::Io(FrameIoError::Io(_)))
        ));

        let short = dir.path().join("short.json");
        std::fs::write(&short, r#"{"rows":2,"cols":2,"data":[30.0]}"#).unwrap();
        assert!(matches!(
            load_frame(&short),
            Err(AnalyzeError::Grid(GridError::LengthMismatch { .. }))
        ));

        let ok = dir.path().join("ok.json");
        let mut frame = ThermalFrame::from_grid(&square_foot());
        frame.foot = Some(FootSide::Right);
        frame.write_json(&ok).unwrap();
        let (grid, side) = load_frame(&ok).unwrap();
        assert_eq!(grid, square_foot());
        assert_eq!(side, Some(FootSide::Right));
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let cfg: AnalyzeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalyzeConfig::default());
        assert_eq!(cfg.asymmetry_threshold, 2.2);
    }
}
