//! systems::polynomial — dynamical systems with known polynomial right-hand sides.
//!
//! Purpose
//! -------
//! Provide ground-truth systems for recovery tests and parameter sweeps. Each
//! system is expressed in exactly the feature basis Z-SINDy searches over
//! (a [`PolynomialLibrary`] with bias), so its coefficient matrix and
//! per-dimension term labels are directly comparable with a fit.
//!
//! Key behaviors
//! -------------
//! - [`PolynomialSystem::rhs`] evaluates `Ξ · θ(x)` through the library.
//! - [`PolynomialSystem::solve`] integrates on the grid `0, dt, …, t_end`
//!   with RK4.
//! - Constructors for the Lorenz, Lotka–Volterra, and decay–growth systems.
use crate::discovery::{
    core::{
        integrate::{Integrator, RungeKutta4},
        library::{FeatureLibrary, PolynomialLibrary},
    },
    errors::{ZSindyError, ZSindyResult},
};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Polynomial ODE `dx/dt = Ξ · θ(x)` with `Ξ` of shape `d × n_f`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialSystem {
    library: PolynomialLibrary,
    coefficients: Array2<f64>,
    integrator: RungeKutta4,
}

impl PolynomialSystem {
    /// # Errors
    /// - [`ZSindyError::DimensionMismatch`] when `coefficients` is not
    ///   `n_variables × n_features` of `library`.
    pub fn new(library: PolynomialLibrary, coefficients: Array2<f64>) -> ZSindyResult<Self> {
        if coefficients.nrows() != library.n_variables() {
            return Err(ZSindyError::DimensionMismatch {
                expected: library.n_variables(),
                actual: coefficients.nrows(),
            });
        }
        if coefficients.ncols() != library.n_features() {
            return Err(ZSindyError::DimensionMismatch {
                expected: library.n_features(),
                actual: coefficients.ncols(),
            });
        }
        Ok(PolynomialSystem { library, coefficients, integrator: RungeKutta4::default() })
    }

    /// Lorenz system on `(x, y, z)`:
    /// `ẋ = σ(y − x)`, `ẏ = x(ρ − z) − y`, `ż = xy − βz`.
    pub fn lorenz(sigma: f64, rho: f64, beta: f64) -> ZSindyResult<Self> {
        Self::from_terms(
            &["x", "y", "z"],
            2,
            &[
                &[("x", -sigma), ("y", sigma)],
                &[("x", rho), ("y", -1.0), ("x*z", -1.0)],
                &[("z", -beta), ("x*y", 1.0)],
            ],
        )
    }

    /// Lotka–Volterra predator–prey on `(x, y)`:
    /// `ẋ = αx − βxy`, `ẏ = δxy − γy`.
    pub fn lotka_volterra(alpha: f64, beta: f64, gamma: f64, delta: f64) -> ZSindyResult<Self> {
        Self::from_terms(
            &["x", "y"],
            2,
            &[&[("x", alpha), ("x*y", -beta)], &[("y", -gamma), ("x*y", delta)]],
        )
    }

    /// Decay driving growth on `(x, y)`: `ẋ = −a·x`, `ẏ = b·xy`.
    pub fn decay_growth(a: f64, b: f64) -> ZSindyResult<Self> {
        Self::from_terms(&["x", "y"], 2, &[&[("x", -a)], &[("x*y", b)]])
    }

    /// Use `substeps` RK4 steps per grid interval in [`PolynomialSystem::solve`].
    pub fn with_substeps(mut self, substeps: usize) -> Self {
        self.integrator = RungeKutta4::new(substeps);
        self
    }

    /// Right-hand side `Ξ · θ(x)` at a single state.
    pub fn rhs(&self, x: ArrayView1<'_, f64>) -> ZSindyResult<Array1<f64>> {
        let theta = self.library.transform(x.insert_axis(Axis(0)))?;
        Ok(self.coefficients.dot(&theta.row(0)))
    }

    /// Integrate from `x0` on the grid `t_i = i · dt`, `i = 0..=round(t_end / dt)`.
    ///
    /// Returns `(t, x)` with `x` of shape `len(t) × d`.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidTimeGrid`] for non-positive or non-finite
    ///   `dt` / `t_end`.
    /// - [`ZSindyError::DimensionMismatch`] when `x0` has the wrong length.
    pub fn solve(
        &self, x0: ArrayView1<'_, f64>, dt: f64, t_end: f64,
    ) -> ZSindyResult<(Array1<f64>, Array2<f64>)> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ZSindyError::InvalidTimeGrid { reason: "dt must be finite and > 0" });
        }
        if !t_end.is_finite() || t_end <= 0.0 {
            return Err(ZSindyError::InvalidTimeGrid { reason: "t_end must be finite and > 0" });
        }
        if x0.len() != self.library.n_variables() {
            return Err(ZSindyError::DimensionMismatch {
                expected: self.library.n_variables(),
                actual: x0.len(),
            });
        }
        let n_steps = (t_end / dt).round() as usize;
        let t = Array1::from_iter((0..=n_steps).map(|i| i as f64 * dt));
        let x = self.integrator.integrate(&|state| self.rhs(state), x0, t.view())?;
        Ok((t, x))
    }

    pub fn true_coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn variable_names(&self) -> &[String] {
        self.library.variable_names()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.library.names()
    }

    pub fn library(&self) -> &PolynomialLibrary {
        &self.library
    }

    /// Per-dimension labels of the active terms, joined by `", "` in library
    /// order (comparable with `ZSindy::get_feature_combinations`).
    pub fn true_feature_labels(&self) -> Vec<String> {
        let names = self.library.names();
        self.coefficients
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, c)| **c != 0.0)
                    .map(|(j, _)| names[j].as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect()
    }

    // ---- Helper methods ----

    fn from_terms(
        variables: &[&str], degree: usize, terms: &[&[(&str, f64)]],
    ) -> ZSindyResult<Self> {
        let library =
            PolynomialLibrary::new(variables.iter().map(|v| v.to_string()).collect(), degree, true);
        let mut coefficients = Array2::<f64>::zeros((variables.len(), library.n_features()));
        for (dim, dim_terms) in terms.iter().enumerate() {
            for &(name, value) in dim_terms.iter() {
                let j = library.index_of(name).ok_or(ZSindyError::DimensionMismatch {
                    expected: library.n_features(),
                    actual: library.n_features() + 1,
                })?;
                coefficients[[dim, j]] = value;
            }
        }
        Self::new(library, coefficients)
    }
}
