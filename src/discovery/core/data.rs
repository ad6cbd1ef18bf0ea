//! Trajectory containers for model discovery.
//!
//! Purpose
//! -------
//! Provide a small, validated container for sampled trajectories of a
//! dynamical system. This module centralizes input validation for raw state
//! samples and their time stamps so the library, differentiation, and scoring
//! layers can assume clean, aligned data.
//!
//! Key behaviors
//! -------------
//! - [`Trajectory`] enforces basic data invariants (non-empty, finite values,
//!   matching sample counts, strictly increasing time stamps).
//! - [`Trajectory::truncated`] produces the leading-window views used by the
//!   experiment harness without re-validating.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x` is `T × d` with `T ≥ 1` and `d ≥ 1`; `t` has length `T`.
//! - Every entry of `x` and `t` is finite.
//! - `t[i] < t[i + 1]` for all `i`.
//!
//! Conventions
//! -----------
//! - Rows are samples, columns are state variables (NumPy layout).
//! - The state dimension `d` is fixed for the lifetime of one fit call.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path and every rejection branch of
//!   `Trajectory::new`.
use crate::discovery::errors::{ZSindyError, ZSindyResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

/// `Trajectory` — validated state samples plus aligned time stamps.
///
/// Purpose
/// -------
/// Represent one sampled trajectory `x_t ∈ ℝ^d` at times `t_i`, validated
/// once at the boundary where raw data enters the discovery stack.
///
/// Fields
/// ------
/// - `x`: `Array2<f64>`
///   State samples, `T × d`.
/// - `t`: `Array1<f64>`
///   Strictly increasing time stamps, length `T`.
///
/// Invariants
/// ----------
/// - `x.nrows() == t.len() > 0` and `x.ncols() > 0`.
/// - All values finite; `t` strictly increasing.
///
/// Performance
/// -----------
/// - Validation is a single O(T·d) scan; afterwards the type is a plain
///   container with no hidden allocations.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// State samples (rows = time, columns = variables).
    pub x: Array2<f64>,
    /// Time stamps aligned with the rows of `x`.
    pub t: Array1<f64>,
}

impl Trajectory {
    /// Construct a validated [`Trajectory`] from raw samples.
    ///
    /// Parameters
    /// ----------
    /// - `x`: `Array2<f64>`
    ///   State samples, `T × d`. Must be non-empty and finite.
    /// - `t`: `Array1<f64>`
    ///   Time stamps of length `T`. Must be finite and strictly increasing.
    ///
    /// Returns
    /// -------
    /// `ZSindyResult<Trajectory>`
    ///   - `Ok(Trajectory)` if all invariants are satisfied.
    ///   - `Err(ZSindyError)` on the first violated invariant.
    ///
    /// Errors
    /// ------
    /// - `ZSindyError::EmptyTrajectory`
    ///   Returned when `x` has zero rows or zero columns.
    /// - `ZSindyError::LengthMismatch { states, times }`
    ///   Returned when `x.nrows() != t.len()`.
    /// - `ZSindyError::NonFiniteData { row, col, value }`
    ///   Returned for the first NaN/±∞ in `x` (or in `t`, reported with
    ///   `col = x.ncols()`).
    /// - `ZSindyError::NonIncreasingTime { index }`
    ///   Returned when `t[index] <= t[index - 1]`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use rust_zsindy::discovery::core::data::Trajectory;
    /// let x = array![[1.0, 2.0], [1.5, 2.5], [2.0, 3.0]];
    /// let t = array![0.0, 0.1, 0.2];
    /// let traj = Trajectory::new(x, t).unwrap();
    /// assert_eq!(traj.n_variables(), 2);
    /// ```
    pub fn new(x: Array2<f64>, t: Array1<f64>) -> ZSindyResult<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ZSindyError::EmptyTrajectory);
        }
        if x.nrows() != t.len() {
            return Err(ZSindyError::LengthMismatch { states: x.nrows(), times: t.len() });
        }

        for ((row, col), &value) in x.indexed_iter() {
            if !value.is_finite() {
                return Err(ZSindyError::NonFiniteData { row, col, value });
            }
        }
        for (row, &value) in t.iter().enumerate() {
            if !value.is_finite() {
                return Err(ZSindyError::NonFiniteData { row, col: x.ncols(), value });
            }
            if row > 0 && value <= t[row - 1] {
                return Err(ZSindyError::NonIncreasingTime { index: row });
            }
        }

        Ok(Trajectory { x, t })
    }

    /// Number of samples `T`.
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of state variables `d`.
    pub fn n_variables(&self) -> usize {
        self.x.ncols()
    }

    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.t.view()
    }

    /// Leading window of the first `len` samples.
    ///
    /// Invariants are inherited from `self`, so no re-validation happens.
    /// Returns `None` when `len == 0` or `len > T`.
    pub fn truncated(&self, len: usize) -> Option<Trajectory> {
        if len == 0 || len > self.n_samples() {
            return None;
        }
        Some(Trajectory {
            x: self.x.slice(s![..len, ..]).to_owned(),
            t: self.t.slice(s![..len]).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction behavior of `Trajectory::new`, including each rejection.
    // - `truncated` window bounds.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `Trajectory::new` accepts a valid trajectory unchanged.
    //
    // Given
    // -----
    // - A 3 × 2 finite state matrix with strictly increasing times.
    //
    // Expect
    // ------
    // - `Ok(..)` with `x` and `t` preserved exactly.
    fn trajectory_new_returns_ok_for_valid_input() {
        let x = array![[1.0, 2.0], [1.5, 2.5], [2.0, 3.0]];
        let t = array![0.0, 0.1, 0.2];

        let traj = Trajectory::new(x.clone(), t.clone()).unwrap();

        assert_eq!(traj.x, x);
        assert_eq!(traj.t, t);
        assert_eq!(traj.n_samples(), 3);
        assert_eq!(traj.n_variables(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Ensure empty state matrices are rejected.
    //
    // Given
    // -----
    // - A 0 × 2 state matrix and an empty time vector.
    //
    // Expect
    // ------
    // - `Err(ZSindyError::EmptyTrajectory)`.
    fn trajectory_new_rejects_empty_input() {
        let x = Array2::<f64>::zeros((0, 2));
        let t = Array1::<f64>::zeros(0);

        assert_eq!(Trajectory::new(x, t).unwrap_err(), ZSindyError::EmptyTrajectory);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a sample-count mismatch between `x` and `t` is rejected.
    //
    // Given
    // -----
    // - 3 state rows but 2 time stamps.
    //
    // Expect
    // ------
    // - `Err(ZSindyError::LengthMismatch { states: 3, times: 2 })`.
    fn trajectory_new_rejects_length_mismatch() {
        let x = array![[1.0], [2.0], [3.0]];
        let t = array![0.0, 1.0];

        assert_eq!(
            Trajectory::new(x, t).unwrap_err(),
            ZSindyError::LengthMismatch { states: 3, times: 2 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure non-finite state values are rejected with their position.
    //
    // Given
    // -----
    // - NaN at row 1, column 0.
    //
    // Expect
    // ------
    // - `Err(NonFiniteData { row: 1, col: 0, .. })`.
    fn trajectory_new_rejects_non_finite_state() {
        let x = array![[1.0], [f64::NAN], [3.0]];
        let t = array![0.0, 1.0, 2.0];

        match Trajectory::new(x, t).unwrap_err() {
            ZSindyError::NonFiniteData { row, col, value } => {
                assert_eq!((row, col), (1, 0));
                assert!(value.is_nan());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure repeated or decreasing time stamps are rejected.
    //
    // Given
    // -----
    // - `t = [0.0, 1.0, 1.0]`.
    //
    // Expect
    // ------
    // - `Err(NonIncreasingTime { index: 2 })`.
    fn trajectory_new_rejects_non_increasing_time() {
        let x = array![[1.0], [2.0], [3.0]];
        let t = array![0.0, 1.0, 1.0];

        assert_eq!(Trajectory::new(x, t).unwrap_err(), ZSindyError::NonIncreasingTime { index: 2 });
    }

    #[test]
    fn truncated_keeps_leading_rows_and_rejects_out_of_range() {
        let x = array![[1.0], [2.0], [3.0]];
        let t = array![0.0, 1.0, 2.0];
        let traj = Trajectory::new(x, t).unwrap();

        let head = traj.truncated(2).unwrap();

        assert_eq!(head.x, array![[1.0], [2.0]]);
        assert_eq!(head.t, array![0.0, 1.0]);
        assert!(traj.truncated(0).is_none());
        assert!(traj.truncated(4).is_none());
    }
}
