use crate::codec::normalize;
use crate::region::{NormalizedRoi, RoiKind, RoiRect, RoiSet};
use foot_thermal_core::{BoundingBox, FootMask, FootSide};
use log::debug;
use serde::{Deserialize, Serialize};

/// Errors raised while building or validating a calibration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("selection for {kind} lies outside the {rows}x{cols} grid")]
    OutOfBounds {
        kind: RoiKind,
        rows: usize,
        cols: usize,
    },
    #[error("selection for {kind} does not cover any foot cell inside the bounding box")]
    NotOnFoot { kind: RoiKind },
    #[error("missing selection for {0}")]
    MissingRegion(RoiKind),
    #[error("normalized region {0} is outside [0, 1] or inverted")]
    InvalidRegion(RoiKind),
    #[error("calibration bounding box is empty (height={height}, width={width})")]
    EmptyBoundingBox { height: usize, width: usize },
}

/// Context captured alongside the normalized regions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationMetadata {
    /// Side of the foot the operator calibrated on.
    pub foot_side: FootSide,
    /// Bounding-box height in effect at calibration time.
    pub bbox_height: usize,
    /// Bounding-box width in effect at calibration time.
    pub bbox_width: usize,
}

/// Three normalized regions plus the calibration context.
///
/// Not tied to any particular grid: the fractions are re-projected onto the
/// bounding box of whatever capture it is applied to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiCalibration {
    #[serde(flatten)]
    pub regions: RoiSet<NormalizedRoi>,
    pub metadata: CalibrationMetadata,
}

impl RoiCalibration {
    /// Check the per-region invariants (`[0, 1]`, `min <= max`).
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (kind, roi) in self.regions.iter() {
            if !roi.is_valid() {
                return Err(CalibrationError::InvalidRegion(kind));
            }
        }
        if self.metadata.bbox_height == 0 || self.metadata.bbox_width == 0 {
            return Err(CalibrationError::EmptyBoundingBox {
                height: self.metadata.bbox_height,
                width: self.metadata.bbox_width,
            });
        }
        Ok(())
    }
}

/// Operator calibration workflow on a single capture.
///
/// Each selection is clipped to the capture's bounding box and must cover at
/// least one foot cell. The calibration is produced once all three regions
/// are selected.
pub struct CalibrationSession<'a> {
    mask: &'a FootMask,
    bbox: BoundingBox,
    side: FootSide,
    selections: RoiSet<Option<RoiRect>>,
}

impl<'a> CalibrationSession<'a> {
    pub fn new(mask: &'a FootMask, bbox: BoundingBox, side: FootSide) -> Self {
        Self {
            mask,
            bbox,
            side,
            selections: RoiSet::default(),
        }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Record (or replace) the selection for `kind`.
    ///
    /// Returns the selection as stored, i.e. clipped to the bounding box.
    pub fn select(&mut self, kind: RoiKind, rect: RoiRect) -> Result<RoiRect, CalibrationError> {
        if rect.max_row >= self.mask.rows || rect.max_col >= self.mask.cols {
            return Err(CalibrationError::OutOfBounds {
                kind,
                rows: self.mask.rows,
                cols: self.mask.cols,
            });
        }
        let bbox_rect = RoiRect {
            min_row: self.bbox.min_row,
            max_row: self.bbox.max_row,
            min_col: self.bbox.min_col,
            max_col: self.bbox.max_col,
        };
        let clipped = rect
            .intersect(&bbox_rect)
            .ok_or(CalibrationError::NotOnFoot { kind })?;

        let on_foot = (clipped.min_row..=clipped.max_row)
            .any(|r| (clipped.min_col..=clipped.max_col).any(|c| self.mask.get(r, c)));
        if !on_foot {
            return Err(CalibrationError::NotOnFoot { kind });
        }

        debug!("selected {kind}: {clipped:?}");
        *self.selections.get_mut(kind) = Some(clipped);
        Ok(clipped)
    }

    /// Regions still waiting for a selection.
    pub fn missing(&self) -> Vec<RoiKind> {
        self.selections
            .iter()
            .filter(|(_, s)| s.is_none())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Normalize all three selections against the session bounding box.
    pub fn finish(self) -> Result<RoiCalibration, CalibrationError> {
        let pick = |kind: RoiKind| {
            self.selections
                .get(kind)
                .map(|rect| normalize(&rect, &self.bbox))
                .ok_or(CalibrationError::MissingRegion(kind))
        };
        let calibration = RoiCalibration {
            regions: RoiSet {
                hallux: pick(RoiKind::Hallux)?,
                first_metatarsal: pick(RoiKind::FirstMetatarsal)?,
                heel: pick(RoiKind::Heel)?,
            },
            metadata: CalibrationMetadata {
                foot_side: self.side,
                bbox_height: self.bbox.height(),
                bbox_width: self.bbox.width(),
            },
        };
        calibration.validate()?;
        Ok(calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_mask(rows: usize, cols: usize, bbox: &BoundingBox) -> FootMask {
        let mut mask = FootMask::empty(rows, cols);
        for r in bbox.min_row..=bbox.max_row {
            for c in bbox.min_col..=bbox.max_col {
                mask.set(r, c, true);
            }
        }
        mask
    }

    fn bbox() -> BoundingBox {
        BoundingBox {
            min_row: 2,
            max_row: 11,
            min_col: 4,
            max_col: 8,
        }
    }

    #[test]
    fn complete_session_produces_calibration() {
        let bbox = bbox();
        let mask = block_mask(14, 12, &bbox);
        let mut session = CalibrationSession::new(&mask, bbox, FootSide::Left);
        session
            .select(RoiKind::Hallux, RoiRect::new(2, 3, 4, 5).unwrap())
            .unwrap();
        session
            .select(RoiKind::FirstMetatarsal, RoiRect::new(4, 5, 4, 6).unwrap())
            .unwrap();
        assert_eq!(session.missing(), vec![RoiKind::Heel]);
        session
            .select(RoiKind::Heel, RoiRect::new(9, 11, 5, 7).unwrap())
            .unwrap();
        assert!(session.is_complete());

        let cal = session.finish().unwrap();
        assert_eq!(cal.metadata.foot_side, FootSide::Left);
        assert_eq!(cal.metadata.bbox_height, 10);
        assert_eq!(cal.metadata.bbox_width, 5);
        assert_eq!(cal.regions.hallux.min_row, 0.0);
        assert_eq!(cal.regions.hallux.max_col, 0.2);
    }

    #[test]
    fn incomplete_session_reports_missing_region() {
        let bbox = bbox();
        let mask = block_mask(14, 12, &bbox);
        let mut session = CalibrationSession::new(&mask, bbox, FootSide::Right);
        session
            .select(RoiKind::Hallux, RoiRect::new(2, 3, 4, 5).unwrap())
            .unwrap();
        assert_eq!(
            session.finish().unwrap_err(),
            CalibrationError::MissingRegion(RoiKind::FirstMetatarsal)
        );
    }

    #[test]
    fn selection_must_touch_the_foot() {
        let bbox = bbox();
        let mut mask = block_mask(14, 12, &bbox);
        mask.set(2, 4, false);
        let mut session = CalibrationSession::new(&mask, bbox, FootSide::Left);

        let off_bbox = session.select(RoiKind::Heel, RoiRect::new(0, 1, 0, 1).unwrap());
        assert_eq!(
            off_bbox.unwrap_err(),
            CalibrationError::NotOnFoot {
                kind: RoiKind::Heel
            }
        );
        let background = session.select(RoiKind::Heel, RoiRect::new(2, 2, 4, 4).unwrap());
        assert!(matches!(
            background,
            Err(CalibrationError::NotOnFoot { .. })
        ));
        let outside = session.select(RoiKind::Heel, RoiRect::new(0, 20, 0, 1).unwrap());
        assert!(matches!(
            outside,
            Err(CalibrationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn selection_is_clipped_to_bbox() {
        let bbox = bbox();
        let mask = block_mask(14, 12, &bbox);
        let mut session = CalibrationSession::new(&mask, bbox, FootSide::Left);
        let stored = session
            .select(RoiKind::Hallux, RoiRect::new(0, 3, 0, 5).unwrap())
            .unwrap();
        assert_eq!(stored, RoiRect::new(2, 3, 4, 5).unwrap());
    }

    #[test]
    fn calibration_json_has_flat_region_keys() {
        let roi = NormalizedRoi {
            min_row: 0.0,
            max_row: 0.5,
            min_col: 0.0,
            max_col: 0.5,
        };
        let cal = RoiCalibration {
            regions: RoiSet {
                hallux: roi,
                first_metatarsal: roi,
                heel: roi,
            },
            metadata: CalibrationMetadata {
                foot_side: FootSide::Right,
                bbox_height: 20,
                bbox_width: 9,
            },
        };
        let value = serde_json::to_value(&cal).unwrap();
        assert!(value.get("hallux").is_some());
        assert!(value.get("firstMetatarsal").is_some());
        assert!(value.get("heel").is_some());
        assert_eq!(value["metadata"]["footSide"], "right");
        assert_eq!(value["metadata"]["bboxHeight"], 20);

        let back: RoiCalibration = serde_json::from_value(value).unwrap();
        assert_eq!(back, cal);
    }
}
