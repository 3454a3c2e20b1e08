//! A single coordinate axis: `n` interior cells plus the ghost values needed
//! by a 3-wide finite-volume stencil.

use tf_core::TfResult;
use tf_core::error::TfError;

/// Coordinate positions along one axis of the structured grid.
///
/// Stores `n + 3` values. Valid logical indices run from `-2` to `n`
/// inclusive; `get` wraps a logical index into the backing storage the same
/// way the reference implementation's coordinate-vector construction does
/// (`numpy.roll(..., -2)`), so that index `-2` recovers the value the
/// storage holds at position `n + 1`, and `-1` recovers position `n + 2`.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    n: usize,
    values: Vec<f64>,
}

impl Axis {
    /// Build a uniform axis on `[start, end]` subdivided into `n` cells.
    pub fn uniform(start: f64, end: f64, n: usize) -> Self {
        let dx = (end - start) / n as f64;
        let len = n + 3;
        // raw[k] = start + (k - 1) * dx for k in 0..len, then rolled left by 2.
        let values = (0..len)
            .map(|pos| {
                let k = (pos + 2) % len;
                start + (k as f64 - 1.0) * dx
            })
            .collect();
        Self { n, values }
    }

    /// Build a stretched axis via a tanh clustering map, valid only on `[0, 1]`.
    ///
    /// Applies `0.5 * (1 + tanh(2*sigma*(x - 0.5)) / tanh(sigma))` pointwise to
    /// a uniform axis on `[start, end]`, including its ghost values.
    pub fn stretched(start: f64, end: f64, n: usize, sigma: f64) -> TfResult<Self> {
        if start < 0.0 || end > 1.0 {
            return Err(TfError::InvalidDomain {
                what: "grid stretching",
                detail: format!(
                    "stretching is only valid on [0, 1], got [{start}, {end}]"
                ),
            });
        }
        let uniform = Self::uniform(start, end, n);
        let tanh_sigma = sigma.tanh();
        let values = uniform
            .values
            .iter()
            .map(|&x| 0.5 * (1.0 + (2.0 * sigma * (x - 0.5)).tanh() / tanh_sigma))
            .collect();
        Ok(Self { n, values })
    }

    /// Builds an axis directly from its raw wrapped storage (length `n + 3`).
    /// Mainly useful for tests that need a grid other than uniform/stretched,
    /// e.g. one matching an externally supplied reference coordinate vector.
    pub fn from_raw(values: Vec<f64>, n: usize) -> Self {
        debug_assert_eq!(values.len(), n + 3);
        Self { n, values }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Coordinate at logical index `i`, valid for `i` in `-2..=n`.
    pub fn get(&self, i: isize) -> f64 {
        let len = self.values.len() as isize;
        let wrapped = i.rem_euclid(len);
        self.values[wrapped as usize]
    }

    /// Cell spacing `x_i - x_{i-1}`.
    pub fn dx(&self, i: isize) -> f64 {
        self.get(i) - self.get(i - 1)
    }

    /// Raw backing storage, in the wrapped order described on [`Axis`].
    pub fn raw(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_coordinate_vector_matches_reference() {
        let axis = Axis::uniform(0.0, 1.0, 5);
        let expected = [0.2, 0.4, 0.6, 0.8, 1.0, 1.2, -0.2, 0.0];
        for (got, want) in axis.raw().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn uniform_grid_invariants() {
        let n = 5;
        let dx = 1.0 / n as f64;
        let axis = Axis::uniform(0.0, 1.0, n);
        for i in 0..n as isize {
            assert!((axis.get(i) - (i as f64 + 1.0) * dx).abs() < 1e-12);
        }
        assert!((axis.get(n as isize - 1) - 1.0).abs() < 1e-12);
        assert!(axis.get(-1).abs() < 1e-12);
        assert!(axis.get(0) > 0.0);
        // ghost spacing matches the interior spacing
        assert!((axis.get(0) - axis.get(-1) - dx).abs() < 1e-12);
    }

    #[test]
    fn shifted_uniform_grid() {
        let n = 5;
        let dx = 3.0 / n as f64;
        let axis = Axis::uniform(1.0, 4.0, n);
        for i in 0..n as isize {
            assert!((axis.get(i) - ((i as f64 + 1.0) * dx + 1.0)).abs() < 1e-12);
        }
        assert!((axis.get(-1) - 1.0).abs() < 1e-12);
        assert!(axis.get(0) > 1.0);
        assert!((axis.get(n as isize - 1) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn stretched_grid_is_increasing_and_hits_endpoint() {
        let n = 5;
        let axis = Axis::stretched(0.0, 1.0, n, 1.5).unwrap();
        assert!(axis.get(-1).abs() < 1e-12);
        assert!(axis.get(0) > 0.0);
        assert!((axis.get(n as isize - 1) - 1.0).abs() < 1e-9);
        for i in 0..n as isize - 1 {
            assert!(axis.get(i) < axis.get(i + 1));
        }
    }

    #[test]
    fn stretched_grid_rejects_domain_outside_unit_interval() {
        let err = Axis::stretched(-0.1, 1.0, 5, 1.5).unwrap_err();
        assert!(matches!(err, TfError::InvalidDomain { .. }));
    }
}
