use serde::{Deserialize, Serialize};

/// Per-cell foot/background labelling of a grid, `true` = foot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootMask {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<bool>, // row-major, len = rows*cols
}

impl FootMask {
    /// All-background mask of the given shape.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Label at `(row, col)`; out-of-bounds reads as background.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        let idx = self.index(row, col);
        self.cells[idx] = value;
    }

    /// Number of foot cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&v| v).count()
    }

    /// True when at least one cell is labelled foot.
    pub fn any(&self) -> bool {
        self.cells.iter().any(|&v| v)
    }

    /// True for cells on the outermost ring of the grid.
    #[inline]
    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }
}

/// Inclusive cell-index rectangle enclosing the foot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl BoundingBox {
    /// Number of rows covered (`max_row - min_row + 1`).
    #[inline]
    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    /// Number of columns covered (`max_col - min_col + 1`).
    #[inline]
    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }

    /// Column centre in cell coordinates.
    #[inline]
    pub fn center_col(&self) -> f64 {
        (self.min_col + self.max_col) as f64 / 2.0
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }
}

/// Mean row/column position of the foot cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub row: f64,
    pub col: f64,
}
