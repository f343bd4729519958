//! Post-clustering mask cleanup: isolated-cell removal and component filtering.

use foot_thermal_core::FootMask;

const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Relabel interior foot cells with fewer than `min_neighbors` foot
/// 8-neighbours as background.
///
/// Cells on the outermost ring are left untouched. Neighbour counts are
/// taken from the input labelling, so the result does not depend on scan
/// order.
pub fn remove_isolated(mask: &FootMask, min_neighbors: usize) -> FootMask {
    let mut out = mask.clone();
    if mask.rows < 3 || mask.cols < 3 {
        return out;
    }

    for r in 1..mask.rows - 1 {
        for c in 1..mask.cols - 1 {
            if !mask.get(r, c) {
                continue;
            }
            let mut neighbors = 0usize;
            for dr in 0..3 {
                for dc in 0..3 {
                    if dr == 1 && dc == 1 {
                        continue;
                    }
                    if mask.get(r + dr - 1, c + dc - 1) {
                        neighbors += 1;
                    }
                }
            }
            if neighbors < min_neighbors {
                out.set(r, c, false);
            }
        }
    }
    out
}

/// Label 4-connected foot components.
///
/// Returns one label per cell (`None` for background) and the size of each
/// component, indexed by label. Uses an explicit worklist, no recursion.
pub fn label_components(mask: &FootMask) -> (Vec<Option<usize>>, Vec<usize>) {
    let (rows, cols) = (mask.rows, mask.cols);
    let mut labels: Vec<Option<usize>> = vec![None; mask.cells.len()];
    let mut visited = vec![false; mask.cells.len()];
    let mut sizes = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for seed in 0..mask.cells.len() {
        if visited[seed] || !mask.cells[seed] {
            continue;
        }
        let label = sizes.len();
        let mut size = 0usize;
        visited[seed] = true;
        stack.push(seed);

        while let Some(idx) = stack.pop() {
            labels[idx] = Some(label);
            size += 1;
            let (r, c) = (idx / cols, idx % cols);
            for (dr, dc) in NEIGHBORS_4 {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if nr >= rows || nc >= cols {
                    continue;
                }
                let n = nr * cols + nc;
                if !visited[n] && mask.cells[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
        sizes.push(size);
    }

    (labels, sizes)
}

/// Keep only the largest 4-connected foot component.
///
/// Ties go to the component found first in row-major order.
pub fn keep_largest_component(mask: &FootMask) -> FootMask {
    let (labels, sizes) = label_components(mask);
    if sizes.len() <= 1 {
        return mask.clone();
    }

    let mut best = 0usize;
    for (label, &size) in sizes.iter().enumerate() {
        if size > sizes[best] {
            best = label;
        }
    }

    FootMask {
        rows: mask.rows,
        cols: mask.cols,
        cells: labels.iter().map(|l| *l == Some(best)).collect(),
    }
}
