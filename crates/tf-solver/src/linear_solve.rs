//! The linear-solve seam behind Newton's method.
//!
//! `Discretization::jacobian` hands back a [`CrsMatrix`]; everything above
//! this module only needs `solve(a, b) -> x`. The default implementation
//! materializes the sparse matrix into a dense `nalgebra::DMatrix` and
//! factors it with LU, falling back to an SVD pseudo-inverse on a singular
//! or ill-conditioned system — the same fallback chain the teacher's old
//! network Newton solver used. Swapping in a true sparse backend later only
//! means implementing this trait.

use nalgebra::{DMatrix, DVector};
use tf_discretization::CrsMatrix;

use crate::error::{SolverError, SolverResult};

pub trait LinearSolve {
    /// Solves `a · x = b` and returns `x`.
    fn solve(&self, a: &CrsMatrix, b: &[f64]) -> SolverResult<Vec<f64>>;
}

/// Dense LU over the materialized CRS matrix, with an SVD pseudo-inverse
/// fallback when LU reports a singular matrix.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenseLuSolve;

impl DenseLuSolve {
    fn to_dense(a: &CrsMatrix) -> DMatrix<f64> {
        let n = a.num_rows();
        let mut dense = DMatrix::zeros(n, n);
        for r in 0..n {
            let (vals, cols) = a.row(r);
            for (&v, &c) in vals.iter().zip(cols.iter()) {
                dense[(r, c)] = v;
            }
        }
        dense
    }
}

impl LinearSolve for DenseLuSolve {
    fn solve(&self, a: &CrsMatrix, b: &[f64]) -> SolverResult<Vec<f64>> {
        let dense = Self::to_dense(a);
        let rhs = DVector::from_row_slice(b);

        if let Some(x) = dense.clone().lu().solve(&rhs) {
            return Ok(x.as_slice().to_vec());
        }

        let svd = dense.svd(true, true);
        let threshold = 1e-10 * svd.singular_values.max();
        let x = svd.solve(&rhs, threshold).map_err(|_| SolverError::SingularJacobian {
            what: "LU failed and the SVD pseudo-inverse is ill-conditioned".to_string(),
        })?;
        Ok(x.as_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_well_conditioned_system() {
        let a = CrsMatrix {
            co_a: vec![2.0, 1.0, 1.0, 3.0],
            jco_a: vec![0, 1, 0, 1],
            beg_a: vec![0, 2, 4],
        };
        let x = DenseLuSolve.solve(&a, &[5.0, 10.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_svd_for_a_singular_matrix() {
        let a = CrsMatrix {
            co_a: vec![1.0, 1.0, 1.0, 1.0],
            jco_a: vec![0, 1, 0, 1],
            beg_a: vec![0, 2, 4],
        };
        let x = DenseLuSolve.solve(&a, &[2.0, 2.0]).unwrap();
        assert!((x[0] + x[1] - 2.0).abs() < 1e-6);
    }
}
