//! Region kinds and rectangle types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three tracked anatomical zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoiKind {
    Hallux,
    FirstMetatarsal,
    Heel,
}

impl RoiKind {
    /// All kinds, in selection order (toe to heel).
    pub const ALL: [RoiKind; 3] = [RoiKind::Hallux, RoiKind::FirstMetatarsal, RoiKind::Heel];

    /// Persistence key of this region.
    pub fn key(self) -> &'static str {
        match self {
            RoiKind::Hallux => "hallux",
            RoiKind::FirstMetatarsal => "firstMetatarsal",
            RoiKind::Heel => "heel",
        }
    }
}

impl fmt::Display for RoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive absolute rectangle in grid-cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiRect {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl RoiRect {
    /// Build a rectangle, rejecting inverted ranges.
    pub fn new(min_row: usize, max_row: usize, min_col: usize, max_col: usize) -> Option<Self> {
        (min_row <= max_row && min_col <= max_col).then_some(Self {
            min_row,
            max_row,
            min_col,
            max_col,
        })
    }

    /// Column centre in cell coordinates.
    #[inline]
    pub fn center_col(&self) -> f64 {
        (self.min_col + self.max_col) as f64 / 2.0
    }

    /// Reflect the column range across the full image width.
    pub fn mirrored(&self, cols: usize) -> Self {
        let last = cols.saturating_sub(1);
        Self {
            min_row: self.min_row,
            max_row: self.max_row,
            min_col: last.saturating_sub(self.max_col),
            max_col: last.saturating_sub(self.min_col),
        }
    }

    /// Reflect the column range across the column axis `lo + hi`, keeping the
    /// result inside `[lo, hi]`.
    pub fn mirrored_within(&self, lo: usize, hi: usize) -> Self {
        let axis = (lo + hi) as i64;
        let reflect = |c: usize| (axis - c as i64).clamp(lo as i64, hi as i64) as usize;
        Self {
            min_row: self.min_row,
            max_row: self.max_row,
            min_col: reflect(self.max_col),
            max_col: reflect(self.min_col),
        }
    }

    /// Rasterize into a row-major boolean mask of shape `rows x cols`.
    ///
    /// Parts of the rectangle outside the grid are dropped.
    pub fn to_mask(&self, rows: usize, cols: usize) -> Vec<bool> {
        let mut mask = vec![false; rows * cols];
        if rows == 0 || cols == 0 {
            return mask;
        }
        for r in self.min_row..=self.max_row.min(rows - 1) {
            for c in self.min_col..=self.max_col.min(cols - 1) {
                mask[r * cols + c] = true;
            }
        }
        mask
    }

    /// Intersection with another rectangle, `None` when disjoint.
    pub fn intersect(&self, other: &RoiRect) -> Option<RoiRect> {
        RoiRect::new(
            self.min_row.max(other.min_row),
            self.max_row.min(other.max_row),
            self.min_col.max(other.min_col),
            self.max_col.min(other.max_col),
        )
    }
}

/// Parses `minRow,maxRow,minCol,maxCol`.
impl FromStr for RoiRect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<usize> = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid rectangle '{s}': {e}"))?;
        let [r0, r1, c0, c1] = parts[..] else {
            return Err(format!(
                "invalid rectangle '{s}': expected minRow,maxRow,minCol,maxCol"
            ));
        };
        RoiRect::new(r0, r1, c0, c1).ok_or_else(|| format!("invalid rectangle '{s}': min > max"))
    }
}

/// Rectangle expressed as fractions of a bounding box's height and width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRoi {
    #[serde(rename = "minRowNorm")]
    pub min_row: f64,
    #[serde(rename = "maxRowNorm")]
    pub max_row: f64,
    #[serde(rename = "minColNorm")]
    pub min_col: f64,
    #[serde(rename = "maxColNorm")]
    pub max_col: f64,
}

impl NormalizedRoi {
    /// All fractions finite, within `[0, 1]`, with `min <= max` per axis.
    pub fn is_valid(&self) -> bool {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        unit(self.min_row)
            && unit(self.max_row)
            && unit(self.min_col)
            && unit(self.max_col)
            && self.min_row <= self.max_row
            && self.min_col <= self.max_col
    }
}

/// One value per anatomical region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiSet<T> {
    pub hallux: T,
    pub first_metatarsal: T,
    pub heel: T,
}

impl<T> RoiSet<T> {
    pub fn get(&self, kind: RoiKind) -> &T {
        match kind {
            RoiKind::Hallux => &self.hallux,
            RoiKind::FirstMetatarsal => &self.first_metatarsal,
            RoiKind::Heel => &self.heel,
        }
    }

    pub fn get_mut(&mut self, kind: RoiKind) -> &mut T {
        match kind {
            RoiKind::Hallux => &mut self.hallux,
            RoiKind::FirstMetatarsal => &mut self.first_metatarsal,
            RoiKind::Heel => &mut self.heel,
        }
    }

    /// Apply `f` to every region.
    pub fn map<U>(&self, mut f: impl FnMut(RoiKind, &T) -> U) -> RoiSet<U> {
        RoiSet {
            hallux: f(RoiKind::Hallux, &self.hallux),
            first_metatarsal: f(RoiKind::FirstMetatarsal, &self.first_metatarsal),
            heel: f(RoiKind::Heel, &self.heel),
        }
    }

    /// Iterate `(kind, value)` in toe-to-heel order.
    pub fn iter(&self) -> impl Iterator<Item = (RoiKind, &T)> + '_ {
        RoiKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

impl<T: Default> Default for RoiSet<T> {
    fn default() -> Self {
        Self {
            hallux: T::default(),
            first_metatarsal: T::default(),
            heel: T::default(),
        }
    }
}
