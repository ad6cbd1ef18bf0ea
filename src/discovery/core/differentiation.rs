//! core::differentiation — time derivatives of sampled trajectories.
//!
//! Purpose
//! -------
//! Turn state samples `x(t_i)` into derivative estimates `ẋ(t_i)` that are
//! row-aligned with the design matrix. The model interface only depends on
//! the [`Differentiator`] trait, so callers can swap in smoother schemes or
//! supply measured derivatives.
//!
//! Key behaviors
//! -------------
//! - [`FiniteDifference`]: second-order accurate three-point stencils on
//!   possibly non-uniform grids (central in the interior, one-sided at both
//!   ends).
//! - [`Precomputed`]: returns caller-provided derivatives after a shape check.
//!
//! Invariants & assumptions
//! ------------------------
//! - `t` is strictly increasing and has one entry per row of `x`; this is
//!   guaranteed when inputs come through
//!   [`crate::discovery::core::data::Trajectory`].
//! - [`FiniteDifference`] needs at least three samples.
//!
//! Testing notes
//! -------------
//! - Stencils are exact on quadratics, which the unit tests use on a
//!   non-uniform grid.
use crate::discovery::errors::{ZSindyError, ZSindyResult};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Capability interface for derivative estimation.
pub trait Differentiator: Send + Sync {
    /// Estimate `ẋ` (`T × d`) from states `x` (`T × d`) sampled at `t`.
    fn differentiate(
        &self, x: ArrayView2<'_, f64>, t: ArrayView1<'_, f64>,
    ) -> ZSindyResult<Array2<f64>>;
}

/// Three-point finite differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiniteDifference;

impl FiniteDifference {
    pub const MIN_SAMPLES: usize = 3;
}

impl Differentiator for FiniteDifference {
    fn differentiate(
        &self, x: ArrayView2<'_, f64>, t: ArrayView1<'_, f64>,
    ) -> ZSindyResult<Array2<f64>> {
        let n = x.nrows();
        if n != t.len() {
            return Err(ZSindyError::LengthMismatch { states: n, times: t.len() });
        }
        if n < Self::MIN_SAMPLES {
            return Err(ZSindyError::InsufficientSamples {
                required: Self::MIN_SAMPLES,
                actual: n,
            });
        }

        let mut xdot = Array2::<f64>::zeros(x.raw_dim());
        for i in 0..n {
            let (rows, weights) = stencil(t, i);
            for col in 0..x.ncols() {
                xdot[[i, col]] = weights
                    .iter()
                    .zip(rows.iter())
                    .map(|(w, &r)| w * x[[r, col]])
                    .sum();
            }
        }
        Ok(xdot)
    }
}

/// Derivatives supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Precomputed {
    xdot: Array2<f64>,
}

impl Precomputed {
    pub fn new(xdot: Array2<f64>) -> Self {
        Precomputed { xdot }
    }
}

impl Differentiator for Precomputed {
    fn differentiate(
        &self, x: ArrayView2<'_, f64>, _t: ArrayView1<'_, f64>,
    ) -> ZSindyResult<Array2<f64>> {
        if self.xdot.nrows() != x.nrows() {
            return Err(ZSindyError::LengthMismatch {
                states: self.xdot.nrows(),
                times: x.nrows(),
            });
        }
        if self.xdot.ncols() != x.ncols() {
            return Err(ZSindyError::DimensionMismatch {
                expected: x.ncols(),
                actual: self.xdot.ncols(),
            });
        }
        Ok(self.xdot.clone())
    }
}

// ---- Helper methods ----

/// Sample rows and weights of the second-order stencil at row `i`.
fn stencil(t: ArrayView1<'_, f64>, i: usize) -> ([usize; 3], [f64; 3]) {
    let n = t.len();
    if i == 0 {
        let (h1, h2) = (t[1] - t[0], t[2] - t[1]);
        let w = [
            -(2.0 * h1 + h2) / (h1 * (h1 + h2)),
            (h1 + h2) / (h1 * h2),
            -h1 / (h2 * (h1 + h2)),
        ];
        ([0, 1, 2], w)
    } else if i == n - 1 {
        let (h1, h2) = (t[n - 2] - t[n - 3], t[n - 1] - t[n - 2]);
        let w = [
            h2 / (h1 * (h1 + h2)),
            -(h1 + h2) / (h1 * h2),
            (h1 + 2.0 * h2) / (h2 * (h1 + h2)),
        ];
        ([n - 3, n - 2, n - 1], w)
    } else {
        let (h1, h2) = (t[i] - t[i - 1], t[i + 1] - t[i]);
        let w = [-h2 / (h1 * (h1 + h2)), (h2 - h1) / (h1 * h2), h1 / (h2 * (h1 + h2))];
        ([i - 1, i, i + 1], w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    // Purpose
    // -------
    // Three-point stencils are exact for quadratics on any grid.
    //
    // Given
    // -----
    // - Non-uniform t = [0, 0.1, 0.25, 0.3, 0.5, 0.8].
    // - Columns x₀ = t², x₁ = 3 − 2t.
    //
    // Expect
    // ------
    // - ẋ₀ = 2t and ẋ₁ = −2 at every row, including both edges.
    fn finite_difference_is_exact_on_quadratics() {
        let t = array![0.0, 0.1, 0.25, 0.3, 0.5, 0.8];
        let mut x = Array2::<f64>::zeros((t.len(), 2));
        for (i, &ti) in t.iter().enumerate() {
            x[[i, 0]] = ti * ti;
            x[[i, 1]] = 3.0 - 2.0 * ti;
        }

        let xdot = FiniteDifference.differentiate(x.view(), t.view()).unwrap();

        for (i, &ti) in t.iter().enumerate() {
            assert!((xdot[[i, 0]] - 2.0 * ti).abs() < 1e-12, "row {i}");
            assert!((xdot[[i, 1]] + 2.0).abs() < 1e-12, "row {i}");
        }
    }

    #[test]
    fn finite_difference_requires_three_samples() {
        let x = array![[1.0], [2.0]];
        let t = array![0.0, 1.0];

        assert_eq!(
            FiniteDifference.differentiate(x.view(), t.view()).unwrap_err(),
            ZSindyError::InsufficientSamples { required: 3, actual: 2 }
        );
    }

    #[test]
    fn precomputed_checks_shape_and_returns_input() {
        let xdot = array![[1.0, 2.0], [3.0, 4.0]];
        let diff = Precomputed::new(xdot.clone());
        let t = Array1::linspace(0.0, 1.0, 2);

        let ok = diff.differentiate(Array2::<f64>::zeros((2, 2)).view(), t.view()).unwrap();
        let bad = diff.differentiate(Array2::<f64>::zeros((2, 3)).view(), t.view());

        assert_eq!(ok, xdot);
        assert_eq!(bad.unwrap_err(), ZSindyError::DimensionMismatch { expected: 3, actual: 2 });
    }
}
