//! Z-SINDy model: fit, predict, simulate, and inspect sparse dynamics.
//!
//! This module wires the feature library, the differentiator, the exhaustive
//! [`ModelSelector`], and the integrator into one stateful model. A fit
//! validates the trajectory, builds `Θ` and `Ẋ`, runs the subset search, and
//! caches the resulting [`FittedModel`] together with the last design matrix
//! so that `predict()` can reuse it.
//!
//! Key ideas:
//! - Collaborators are trait objects ([`FeatureLibrary`], [`Differentiator`],
//!   [`Integrator`]); [`ZSindy::new`] picks the polynomial library,
//!   finite differences, and RK4.
//! - Without an injected library, the polynomial library is rebuilt on every
//!   fit from `options.poly_degree` and the data dimension, so one model can
//!   be refit on systems of different size.
//! - Cached state is only replaced after a fit succeeds; a failed fit leaves
//!   the previous results readable.
use crate::discovery::{
    core::{
        data::Trajectory,
        differentiation::{Differentiator, FiniteDifference, Precomputed},
        integrate::{Integrator, RungeKutta4},
        library::{FeatureLibrary, PolynomialLibrary},
        options::ZSindyOptions,
    },
    errors::{ZSindyError, ZSindyResult},
    models::{fitted::FittedModel, selector::ModelSelector},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::fmt;
use tracing::debug;

/// Z-SINDy model with cached fit results.
///
/// Encapsulates the fit options, the collaborators used to build the
/// regression problem, and the state populated by `fit`.
///
/// # Notes
/// - `fitted` and the cached design matrix are `None` until a fit succeeds.
/// - The model is `Send + Sync`; fitting takes `&mut self`, inspection `&self`.
pub struct ZSindy {
    /// Fit options.
    pub options: ZSindyOptions,
    /// Library used by the last fit (or injected by the caller).
    library: Option<Box<dyn FeatureLibrary>>,
    /// Whether `library` was injected and must be kept across fits.
    library_injected: bool,
    differentiator: Box<dyn Differentiator>,
    integrator: Box<dyn Integrator>,
    /// Fit results (populated after `fit`).
    pub fitted: Option<FittedModel>,
    /// Design matrix of the last successful fit.
    theta: Option<Array2<f64>>,
}

impl ZSindy {
    /// Construct a model with the default collaborators: a polynomial library
    /// of degree `options.poly_degree` (built at fit time), second-order
    /// finite differences, and RK4.
    pub fn new(options: ZSindyOptions) -> Self {
        ZSindy {
            options,
            library: None,
            library_injected: false,
            differentiator: Box::new(FiniteDifference),
            integrator: Box::new(RungeKutta4::default()),
            fitted: None,
            theta: None,
        }
    }

    /// Construct a model with an injected library and differentiator.
    ///
    /// The library's variable count must match the data passed to `fit`.
    pub fn with_components(
        options: ZSindyOptions, library: Box<dyn FeatureLibrary>,
        differentiator: Box<dyn Differentiator>,
    ) -> Self {
        ZSindy {
            options,
            library: Some(library),
            library_injected: true,
            differentiator,
            integrator: Box::new(RungeKutta4::default()),
            fitted: None,
            theta: None,
        }
    }

    /// Replace the integrator used by [`ZSindy::simulate`].
    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    /// Fit the model to states `x` (`T × d`) sampled at `t`.
    ///
    /// ## Steps
    /// 1. Validate `(x, t)` as a [`Trajectory`].
    /// 2. Differentiate with the configured [`Differentiator`].
    /// 3. Build `Θ` with the library and run the [`ModelSelector`].
    /// 4. Cache the [`FittedModel`] and `Θ`.
    ///
    /// ## Returns
    /// - The `d × n_f` sparse coefficient matrix.
    ///
    /// ## Errors
    /// - Trajectory validation errors, differentiation errors
    ///   (e.g. [`ZSindyError::InsufficientSamples`]), library shape errors,
    ///   and [`ZSindyError::NoValidModel`] from selection.
    pub fn fit(&mut self, x: Array2<f64>, t: Array1<f64>) -> ZSindyResult<Array2<f64>> {
        let traj = Trajectory::new(x, t)?;
        let xdot = self.differentiator.differentiate(traj.states(), traj.times())?;
        debug!(
            target: "rust_zsindy::model",
            samples = traj.n_samples(),
            variables = traj.n_variables(),
            "derivatives estimated"
        );
        self.fit_inner(&traj, xdot)
    }

    /// Fit with caller-supplied derivatives `xdot` (`T × d`), bypassing the
    /// differentiator.
    pub fn fit_with_derivatives(
        &mut self, x: Array2<f64>, t: Array1<f64>, xdot: Array2<f64>,
    ) -> ZSindyResult<Array2<f64>> {
        let traj = Trajectory::new(x, t)?;
        let xdot = Precomputed::new(xdot).differentiate(traj.states(), traj.times())?;
        if let Some(((row, col), &value)) = xdot.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ZSindyError::NonFiniteData { row, col, value });
        }
        self.fit_inner(&traj, xdot)
    }

    /// `Θ · Ξᵀ` on the design matrix of the last fit (`T × d`).
    ///
    /// ## Errors
    /// - [`ZSindyError::NotFitted`] before a successful fit.
    pub fn predict(&self) -> ZSindyResult<Array2<f64>> {
        let fitted = self.fitted()?;
        let theta = self.theta.as_ref().ok_or(ZSindyError::NotFitted)?;
        Ok(theta.dot(&fitted.coefficients.t()))
    }

    /// `Θ(x) · Ξᵀ` for new states `x` (`T × d`).
    pub fn predict_on(&self, x: ArrayView2<'_, f64>) -> ZSindyResult<Array2<f64>> {
        let fitted = self.fitted()?;
        let library = self.library.as_ref().ok_or(ZSindyError::NotFitted)?;
        let theta = library.transform(x)?;
        Ok(theta.dot(&fitted.coefficients.t()))
    }

    /// Integrate `dx/dt = Ξ · θ(x)` from `x0` over the grid `t`.
    ///
    /// ## Arguments
    /// - `x0`: initial state (length `d`).
    /// - `t`: strictly increasing time grid; row `i` of the result is the
    ///   state at `t[i]`.
    /// - `coefs`: optional `d × n_f` coefficients; defaults to the fitted ones.
    ///
    /// ## Errors
    /// - [`ZSindyError::NotFitted`] when `coefs` is `None` and nothing has been
    ///   fitted.
    /// - [`ZSindyError::DimensionMismatch`] when `coefs` does not match `x0`
    ///   and the library.
    /// - [`ZSindyError::InvalidTimeGrid`] from the integrator.
    pub fn simulate(
        &self, x0: ArrayView1<'_, f64>, t: ArrayView1<'_, f64>, coefs: Option<&Array2<f64>>,
    ) -> ZSindyResult<Array2<f64>> {
        let coefs = match coefs {
            Some(c) => c,
            None => &self.fitted()?.coefficients,
        };

        let built;
        let library: &dyn FeatureLibrary = match &self.library {
            Some(lib) => lib.as_ref(),
            None => {
                built = self.default_library(x0.len())?;
                &built
            }
        };
        if coefs.nrows() != x0.len() {
            return Err(ZSindyError::DimensionMismatch { expected: x0.len(), actual: coefs.nrows() });
        }
        if coefs.ncols() != library.n_features() {
            return Err(ZSindyError::DimensionMismatch {
                expected: library.n_features(),
                actual: coefs.ncols(),
            });
        }

        self.integrator.integrate(
            &|x| {
                let theta = library.transform(x.insert_axis(Axis(0)))?;
                Ok(coefs.dot(&theta.row(0)))
            },
            x0,
            t,
        )
    }

    /// Equation strings of the fitted model, one per state variable.
    pub fn equations(&self, precision: usize) -> ZSindyResult<Vec<String>> {
        Ok(self.fitted()?.equations(precision))
    }

    /// Print the fitted equations to stdout.
    pub fn print(&self) -> ZSindyResult<()> {
        print!("{}", self.fitted()?);
        Ok(())
    }

    pub fn fitted(&self) -> ZSindyResult<&FittedModel> {
        self.fitted.as_ref().ok_or(ZSindyError::NotFitted)
    }

    /// `d × n_f` coefficient matrix of the last fit.
    pub fn coefficients(&self) -> ZSindyResult<&Array2<f64>> {
        Ok(&self.fitted()?.coefficients)
    }

    /// `d × n_f` coefficient variances of the last fit.
    pub fn variances(&self) -> ZSindyResult<&Array2<f64>> {
        Ok(&self.fitted()?.variances)
    }

    /// Per-dimension probabilities in ranked order.
    pub fn get_probabilities(&self) -> ZSindyResult<Vec<Vec<f64>>> {
        Ok(self.fitted()?.probabilities())
    }

    /// Per-dimension normalized free energies in ranked order.
    pub fn get_free_energies(&self) -> ZSindyResult<Vec<Vec<f64>>> {
        Ok(self.fitted()?.free_energies())
    }

    /// Per-dimension candidate labels (e.g. `"x, x*y"`) in ranked order.
    pub fn get_feature_combinations(&self) -> ZSindyResult<Vec<Vec<String>>> {
        Ok(self.fitted()?.feature_combinations())
    }

    /// Feature names of the active library.
    ///
    /// Available before a fit when a library was injected or
    /// `options.variable_names` is set; otherwise the data dimension is
    /// unknown and [`ZSindyError::NotFitted`] is returned.
    pub fn feature_names(&self) -> ZSindyResult<Vec<String>> {
        match (&self.library, &self.options.variable_names) {
            (Some(lib), _) => Ok(lib.names()),
            (None, Some(names)) => Ok(self.default_library(names.len())?.names()),
            (None, None) => Err(ZSindyError::NotFitted),
        }
    }

    // ---- Helper methods ----

    fn default_library(&self, n_variables: usize) -> ZSindyResult<PolynomialLibrary> {
        let names = self.options.resolve_variable_names(n_variables);
        if names.len() != n_variables {
            return Err(ZSindyError::DimensionMismatch {
                expected: n_variables,
                actual: names.len(),
            });
        }
        Ok(PolynomialLibrary::new(names, self.options.poly_degree, true))
    }

    fn fit_inner(&mut self, traj: &Trajectory, xdot: Array2<f64>) -> ZSindyResult<Array2<f64>> {
        let n_vars = traj.n_variables();
        let variable_names = self.options.resolve_variable_names(n_vars);
        if variable_names.len() != n_vars {
            return Err(ZSindyError::DimensionMismatch {
                expected: n_vars,
                actual: variable_names.len(),
            });
        }

        let fresh: Option<Box<dyn FeatureLibrary>> = if self.library_injected {
            None
        } else {
            Some(Box::new(self.default_library(n_vars)?))
        };
        let library = match (&fresh, &self.library) {
            (Some(lib), _) | (None, Some(lib)) => lib.as_ref(),
            (None, None) => return Err(ZSindyError::NotFitted),
        };

        let theta = library.transform(traj.states())?;
        let fitted = ModelSelector::new(&self.options).select(
            theta.view(),
            xdot.view(),
            library.names(),
            variable_names,
        )?;
        let coefficients = fitted.coefficients.clone();

        if fresh.is_some() {
            self.library = fresh;
        }
        self.theta = Some(theta);
        self.fitted = Some(fitted);
        Ok(coefficients)
    }
}

impl fmt::Debug for ZSindy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZSindy")
            .field("options", &self.options)
            .field("library", &self.library.as_ref().map(|lib| lib.names()))
            .field("fitted", &self.fitted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::core::library::FourierLibrary;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `NotFitted` from every accessor before a fit.
    // - Fits through `fit_with_derivatives` and injected components.
    // - `predict` shape and `simulate` argument validation.
    //
    // Pipeline-level recovery and determinism are covered in
    // `tests/integration_zsindy_pipeline.rs`.
    // -------------------------------------------------------------------------

    fn decay(n: usize) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
        let t: Array1<f64> = Array1::linspace(0.0, 2.0, n);
        let x = Array2::from_shape_fn((n, 1), |(i, _)| (-0.5 * t[i]).exp());
        let xdot = x.mapv(|v| -0.5 * v);
        (x, t, xdot)
    }

    #[test]
    // Purpose
    // -------
    // Every accessor refuses to answer before a fit.
    //
    // Given
    // -----
    // - A freshly constructed model with default options.
    //
    // Expect
    // ------
    // - `NotFitted` from predict, simulate (no coefs), and all getters.
    fn accessors_return_not_fitted_before_fit() {
        let model = ZSindy::new(ZSindyOptions::default());

        assert_eq!(model.predict().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.coefficients().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.variances().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.get_probabilities().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.get_free_energies().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.get_feature_combinations().unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.equations(3).unwrap_err(), ZSindyError::NotFitted);
        assert_eq!(model.print().unwrap_err(), ZSindyError::NotFitted);
        let t = array![0.0, 0.1];
        assert_eq!(
            model.simulate(array![1.0].view(), t.view(), None).unwrap_err(),
            ZSindyError::NotFitted
        );
    }

    #[test]
    // Purpose
    // -------
    // A fit populates coefficients, predictions, and ranked outputs.
    //
    // Given
    // -----
    // - x = e^{−t/2} with exact derivatives, degree-2 library, max 2 terms.
    //
    // Expect
    // ------
    // - Coefficient on `x` ≈ −0.5, all others zero; predict ≈ ẋ; ranked
    //   lists are aligned per dimension.
    fn fit_with_derivatives_recovers_decay_rate() {
        let (x, t, xdot) = decay(200);
        let opts = ZSindyOptions::new(0.01, 1.0, 2, 2).unwrap();
        let mut model = ZSindy::new(opts);

        let coefs = model.fit_with_derivatives(x, t, xdot.clone()).unwrap();

        assert_eq!(model.feature_names().unwrap(), vec!["1", "x", "x^2"]);
        assert!((coefs[[0, 1]] + 0.5).abs() < 1e-8);
        assert_eq!(coefs[[0, 0]], 0.0);
        assert_eq!(coefs[[0, 2]], 0.0);
        let pred = model.predict().unwrap();
        assert!((&pred - &xdot).iter().all(|e| e.abs() < 1e-8));
        let probs = model.get_probabilities().unwrap();
        let labels = model.get_feature_combinations().unwrap();
        assert_eq!(probs[0].len(), labels[0].len());
        assert_eq!(labels[0][0], "x");
        assert_eq!(model.equations(3).unwrap(), vec!["(x)' = -0.500 x"]);
    }

    #[test]
    fn fit_rejects_non_finite_derivatives() {
        let (x, t, mut xdot) = decay(10);
        xdot[[3, 0]] = f64::NAN;
        let mut model = ZSindy::new(ZSindyOptions::default());

        let err = model.fit_with_derivatives(x, t, xdot).unwrap_err();

        assert!(matches!(err, ZSindyError::NonFiniteData { row: 3, col: 0, .. }));
        assert!(model.fitted.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Injected components are used as given.
    //
    // Given
    // -----
    // - A Fourier library on a pure sine derivative: ẋ = cos(x) with
    //   precomputed derivatives.
    //
    // Expect
    // ------
    // - The winning combination is `cos(x)` with coefficient ≈ 1.
    fn injected_library_and_differentiator_are_used() {
        let n = 100;
        let t = Array1::linspace(0.0, 1.0, n);
        let x = Array2::from_shape_fn((n, 1), |(i, _)| -1.0 + 2.5 * t[i]);
        let xdot = x.mapv(f64::cos);
        let library = FourierLibrary::new(vec!["x".to_string()], 1).unwrap();
        let opts = ZSindyOptions::new(0.01, 1.0, 1, 2).unwrap();
        let mut model = ZSindy::with_components(
            opts,
            Box::new(library),
            Box::new(Precomputed::new(xdot)),
        );

        let coefs = model.fit(x, t).unwrap();

        assert_eq!(model.get_feature_combinations().unwrap()[0][0], "cos(x)");
        assert!((coefs[[0, 1]] - 1.0).abs() < 1e-8);
        assert_eq!(coefs[[0, 0]], 0.0);
    }

    #[test]
    fn simulate_checks_coefficient_shape() {
        let model = ZSindy::new(ZSindyOptions::default().with_variable_names(vec!["x"]));
        let t = array![0.0, 0.1, 0.2];
        let wrong = Array2::<f64>::zeros((1, 4));

        let err = model.simulate(array![1.0].view(), t.view(), Some(&wrong)).unwrap_err();

        assert_eq!(err, ZSindyError::DimensionMismatch { expected: 3, actual: 4 });
    }

    #[test]
    fn simulate_with_explicit_coefficients_before_fit() {
        let model = ZSindy::new(ZSindyOptions::default());
        let t = Array1::linspace(0.0, 1.0, 101);
        // dx/dt = -x on the library (1, x, x^2).
        let coefs = array![[0.0, -1.0, 0.0]];

        let traj = model.simulate(array![1.0].view(), t.view(), Some(&coefs)).unwrap();

        assert!((traj[[100, 0]] - (-1.0_f64).exp()).abs() < 1e-8);
    }
}
