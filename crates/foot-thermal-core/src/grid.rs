use serde::{Deserialize, Serialize};

/// Errors raised when building a [`TemperatureGrid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid data length mismatch (expected {expected} = {rows}x{cols}, got {got})")]
    LengthMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        got: usize,
    },
    #[error("grid dimensions overflow (rows={rows}, cols={cols})")]
    DimensionOverflow { rows: usize, cols: usize },
}

/// Immutable row-major grid of temperature readings in degrees Celsius.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRecord")]
pub struct TemperatureGrid {
    rows: usize,
    cols: usize,
    data: Vec<f32>, // row-major, len = rows*cols
}

#[derive(Deserialize)]
struct GridRecord {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<GridRecord> for TemperatureGrid {
    type Error = GridError;

    fn try_from(raw: GridRecord) -> Result<Self, Self::Error> {
        Self::new(raw.rows, raw.cols, raw.data)
    }
}

impl TemperatureGrid {
    /// Build a grid, checking that `data.len() == rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, GridError> {
        let expected = rows
            .checked_mul(cols)
            .ok_or(GridError::DimensionOverflow { rows, cols })?;
        if data.len() != expected {
            return Err(GridError::LengthMismatch {
                rows,
                cols,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Grid where every cell holds `value`.
    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Build a grid from a per-cell function `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major readings.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Temperature at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[self.index(row, col)])
    }

    /// Mirror the grid left/right (column `c` becomes `cols - 1 - c`).
    pub fn mirrored(&self) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| {
            self.data[r * self.cols + (self.cols - 1 - c)]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_mismatch() {
        let err = TemperatureGrid::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            GridError::LengthMismatch {
                rows: 2,
                cols: 3,
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn empty_grid_is_valid() {
        let grid = TemperatureGrid::new(0, 5, Vec::new()).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.cols(), 5);
    }

    #[test]
    fn mirrored_swaps_columns() {
        let grid = TemperatureGrid::from_fn(2, 3, |r, c| (r * 10 + c) as f32);
        let m = grid.mirrored();
        assert_eq!(m.data(), &[2.0, 1.0, 0.0, 12.0, 11.0, 10.0]);
    }

    #[test]
    fn deserialization_validates_length() {
        let ok: TemperatureGrid =
            serde_json::from_str(r#"{"rows":1,"cols":2,"data":[30.0,31.5]}"#).unwrap();
        assert_eq!(ok.get(0, 1), Some(31.5));

        let bad = serde_json::from_str::<TemperatureGrid>(r#"{"rows":2,"cols":2,"data":[1.0]}"#);
        assert!(bad.is_err());
    }
}
