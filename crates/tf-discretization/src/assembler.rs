//! Folds a combined [`StencilTensor`] into compressed-row-storage form.
//!
//! Mirrors the reference suite's `assemble_jacobian`: for every cell and row
//! dof, scan stencil offsets in canonical order `(sz, sy, sx, d2)` and emit
//! one CRS entry per coefficient that survives the drop threshold.

use rayon::prelude::*;

use tf_grid::GridMetrics;
use tf_stencil::StencilTensor;

/// Coefficients below this magnitude are treated as structural zeros and
/// dropped from the sparsity pattern.
const DROP_THRESHOLD: f64 = 1e-14;

/// A sparse matrix in compressed row storage: `co_a` holds the nonzero
/// values, `jco_a` their column indices, `beg_a` the row pointers (length
/// `n + 1`).
#[derive(Clone, Debug, Default)]
pub struct CrsMatrix {
    pub co_a: Vec<f64>,
    pub jco_a: Vec<usize>,
    pub beg_a: Vec<usize>,
}

impl CrsMatrix {
    pub fn num_rows(&self) -> usize {
        self.beg_a.len().saturating_sub(1)
    }

    pub fn row(&self, r: usize) -> (&[f64], &[usize]) {
        let start = self.beg_a[r];
        let end = self.beg_a[r + 1];
        (&self.co_a[start..end], &self.jco_a[start..end])
    }

    /// Dense matrix-vector product, mainly useful for tests comparing
    /// against a reference dense Jacobian.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.num_rows()];
        for r in 0..self.num_rows() {
            let (vals, cols) = self.row(r);
            let mut acc = 0.0;
            for (&v, &c) in vals.iter().zip(cols.iter()) {
                acc += v * x[c];
            }
            out[r] = acc;
        }
        out
    }
}

fn row_index(grid: &GridMetrics, dof: usize, i: usize, j: usize, k: usize, d1: usize) -> usize {
    d1 + i * dof + j * dof * grid.nx + k * dof * grid.nx * grid.ny
}

/// Assembles `atom` into a [`CrsMatrix`]. Row order is natural `(k, j, i,
/// d1)`; within a row, columns are emitted in `(sz, sy, sx, d2)` order,
/// which is ascending in the column-index formula below whenever the
/// stencil is fully populated, matching the reference assembler's output
/// order bit-for-bit.
pub fn assemble(atom: &StencilTensor, grid: &GridMetrics, dof: usize) -> CrsMatrix {
    let num_cells = grid.nx * grid.ny * grid.nz;
    let rows_per_cell: Vec<Vec<(Vec<f64>, Vec<usize>)>> = (0..num_cells)
        .into_par_iter()
        .map(|cell| {
            let k = cell / (grid.nx * grid.ny);
            let j = (cell / grid.nx) % grid.ny;
            let i = cell % grid.nx;
            (0..dof)
                .map(|d1| assemble_row(atom, grid, dof, i, j, k, d1))
                .collect()
        })
        .collect();

    let mut co_a = Vec::new();
    let mut jco_a = Vec::new();
    let mut beg_a = vec![0usize];

    for cell_rows in rows_per_cell {
        for (vals, cols) in cell_rows {
            co_a.extend(vals);
            jco_a.extend(cols);
            beg_a.push(co_a.len());
        }
    }

    CrsMatrix { co_a, jco_a, beg_a }
}

fn assemble_row(
    atom: &StencilTensor,
    grid: &GridMetrics,
    dof: usize,
    i: usize,
    j: usize,
    k: usize,
    d1: usize,
) -> (Vec<f64>, Vec<usize>) {
    let row = row_index(grid, dof, i, j, k, d1);
    let mut vals = Vec::new();
    let mut cols = Vec::new();

    for sz in 0..3usize {
        for sy in 0..3usize {
            for sx in 0..3usize {
                for d2 in 0..dof {
                    let coeff = atom.get(i, j, k, d1, d2, sx, sy, sz);
                    if coeff.abs() <= DROP_THRESHOLD {
                        continue;
                    }
                    let col = row as isize
                        + (sx as isize - 1) * dof as isize
                        + (sy as isize - 1) * grid.nx as isize * dof as isize
                        + (sz as isize - 1) * grid.nx as isize * grid.ny as isize * dof as isize
                        + (d2 as isize - d1 as isize);
                    debug_assert!(
                        col >= 0 && (col as usize) < grid.nx * grid.ny * grid.nz * dof,
                        "assembled column {col} out of range; boundary handler left a dangling ghost reference"
                    );
                    vals.push(coeff);
                    cols.push(col as usize);
                }
            }
        }
    }

    (vals, cols)
}
