//! Bounding box and centroid of a foot mask.
//!
//! The bounding box is computed over "connected" foot cells only, so a
//! stray hot pixel far away from the foot does not stretch the box.

use foot_thermal_core::{BoundingBox, Centroid, FootMask};

const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Minimal connected cells a row needs to count as part of the foot.
const MIN_ROW_CELLS: usize = 2;

/// Connectivity-filtered bounding box of the foot mask.
///
/// Falls back to the plain bounding box of the raw mask when the filtered
/// scan yields no valid range. Returns `None` when the mask has no foot
/// cells at all.
pub fn bounding_box(mask: &FootMask) -> Option<BoundingBox> {
    if !mask.any() {
        return None;
    }
    let connected = connected_cells(mask);
    filtered_bbox(mask, &connected).or_else(|| naive_bbox(mask))
}

/// Mean row/column index of all foot cells, `None` for an empty mask.
pub fn centroid(mask: &FootMask) -> Option<Centroid> {
    let mut sum_r = 0f64;
    let mut sum_c = 0f64;
    let mut count = 0usize;
    for r in 0..mask.rows {
        for c in 0..mask.cols {
            if mask.get(r, c) {
                sum_r += r as f64;
                sum_c += c as f64;
                count += 1;
            }
        }
    }
    (count > 0).then(|| Centroid {
        row: sum_r / count as f64,
        col: sum_c / count as f64,
    })
}

fn neighbors4(mask: &FootMask, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    NEIGHBORS_4.iter().filter_map(move |&(dr, dc)| {
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < mask.rows && nc < mask.cols).then_some((nr, nc))
    })
}

/// Interior foot cells with at least one foot 4-neighbour, plus border foot
/// cells touching a connected or interior foot cell.
fn connected_cells(mask: &FootMask) -> Vec<bool> {
    let mut connected = vec![false; mask.cells.len()];

    for r in 0..mask.rows {
        for c in 0..mask.cols {
            if !mask.get(r, c) || mask.is_border(r, c) {
                continue;
            }
            if neighbors4(mask, r, c).any(|(nr, nc)| mask.get(nr, nc)) {
                connected[mask.index(r, c)] = true;
            }
        }
    }

    for r in 0..mask.rows {
        for c in 0..mask.cols {
            if !mask.get(r, c) || !mask.is_border(r, c) {
                continue;
            }
            let touches = neighbors4(mask, r, c).any(|(nr, nc)| {
                connected[mask.index(nr, nc)] || (mask.get(nr, nc) && !mask.is_border(nr, nc))
            });
            if touches {
                connected[mask.index(r, c)] = true;
            }
        }
    }

    connected
}

fn filtered_bbox(mask: &FootMask, connected: &[bool]) -> Option<BoundingBox> {
    let row_count = |r: usize| {
        (0..mask.cols)
            .filter(|&c| connected[mask.index(r, c)])
            .count()
    };

    let min_row = (0..mask.rows).find(|&r| row_count(r) >= MIN_ROW_CELLS)?;
    let max_row = (0..mask.rows).rev().find(|&r| row_count(r) >= MIN_ROW_CELLS)?;
    if min_row > max_row {
        return None;
    }

    let mut min_col = usize::MAX;
    let mut max_col = 0usize;
    for r in min_row..=max_row {
        for c in 0..mask.cols {
            if connected[mask.index(r, c)] {
                min_col = min_col.min(c);
                max_col = max_col.max(c);
            }
        }
    }
    if min_col > max_col {
        return None;
    }

    Some(BoundingBox {
        min_row,
        max_row,
        min_col,
        max_col,
    })
}

fn naive_bbox(mask: &FootMask) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    for r in 0..mask.rows {
        for c in 0..mask.cols {
            if !mask.get(r, c) {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_row: r,
                    max_row: r,
                    min_col: c,
                    max_col: c,
                },
                Some(b) => BoundingBox {
                    min_row: b.min_row.min(r),
                    max_row: b.max_row.max(r),
                    min_col: b.min_col.min(c),
                    max_col: b.max_col.max(c),
                },
            });
        }
    }
    bbox
}
