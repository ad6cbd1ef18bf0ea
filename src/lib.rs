//! rust_zsindy — Bayesian sparse model discovery for dynamical systems.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the Z-SINDy model to Python via the `_rust_zsindy` extension module. Z-SINDy
//! enumerates every sparse subset of a feature library up to a maximum size,
//! scores each subset by its Bayesian free energy, and reports the winner
//! together with a probability for every candidate.
//!
//! Key behaviors
//! -------------
//! - Expose the core modules as the public crate surface:
//!   - `discovery`: feature libraries, evidence scoring, model selection, and
//!     the [`discovery::ZSindy`] model interface.
//!   - `systems`: reference polynomial ODEs with known coefficients.
//!   - `experiments`: phase-diagram sweeps over noise, penalty, and data size.
//! - With `python-bindings`, define the `ZSindy` `#[pyclass]` wrapper and the
//!   `#[pymodule]` initializer, registering the `rust_zsindy.models`
//!   submodule so that dot-notation imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - The library emits `tracing` events but never installs a subscriber.
//!
//! Conventions
//! -----------
//! - Arrays are row-major with rows = samples and columns = state variables.
//! - Errors are [`discovery::ZSindyError`] internally and become `ValueError`
//!   at the PyO3 boundary.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end pipeline test in `tests/integration_zsindy_pipeline.rs`.

pub mod discovery;
pub mod experiments;
pub mod systems;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{PyArray2, ToPyArray};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    discovery::models::zsindy::ZSindy as ZSindyModel,
    utils::{build_options, extract_f64_array, extract_f64_matrix},
};

/// ZSindy — Python-facing wrapper for the Z-SINDy model.
///
/// Purpose
/// -------
/// Expose [`discovery::ZSindy`] to Python callers while keeping the Rust
/// invariants and error handling.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `ZSindy(rho=0.1, lmbda=0.0, max_num_terms=3, poly_degree=2, variable_names=None, ...)`.
///
/// Fields
/// ------
/// - `inner`: [`discovery::ZSindy`]
///   Model that owns the collaborators and the cached fit.
///
/// Notes
/// -----
/// - Matrices are returned as fresh `numpy.ndarray` copies.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_zsindy.models")]
pub struct ZSindy {
    pub inner: ZSindyModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ZSindy {
    #[new]
    #[pyo3(
        signature = (
            rho = 0.1,
            lmbda = 0.0,
            max_num_terms = 3,
            poly_degree = 2,
            variable_names = None,
            use_all_fe = None,
            sort_all = None,
            normalize_lambda = None,
            variance_mode = None,
        ),
        text_signature = "(rho=0.1, lmbda=0.0, max_num_terms=3, poly_degree=2, \
                          variable_names=None, use_all_fe=True, sort_all=True, \
                          normalize_lambda=False, variance_mode='restricted')"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rho: f64, lmbda: f64, max_num_terms: usize, poly_degree: usize,
        variable_names: Option<Vec<String>>, use_all_fe: Option<bool>, sort_all: Option<bool>,
        normalize_lambda: Option<bool>, variance_mode: Option<&str>,
    ) -> PyResult<Self> {
        let opts = build_options(
            rho,
            lmbda,
            max_num_terms,
            poly_degree,
            variable_names,
            use_all_fe,
            sort_all,
            normalize_lambda,
            variance_mode,
        )?;
        Ok(ZSindy { inner: ZSindyModel::new(opts) })
    }

    /// Fit to states `x` (T × d) at times `t`; returns the d × n_f coefficients.
    #[pyo3(signature = (x, t, x_dot = None), text_signature = "(self, x, t, /, x_dot=None)")]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, x: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>,
        x_dot: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let x = extract_f64_matrix(x)?;
        let t = extract_f64_array(t)?;
        let coefs = match x_dot {
            Some(raw) => self.inner.fit_with_derivatives(x, t, extract_f64_matrix(raw)?)?,
            None => self.inner.fit(x, t)?,
        };
        Ok(coefs.to_pyarray(py))
    }

    /// Predicted derivatives on the fit data, or on `x` when given.
    #[pyo3(signature = (x = None), text_signature = "(self, /, x=None)")]
    pub fn predict<'py>(
        &self, py: Python<'py>, x: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let pred = match x {
            Some(raw) => self.inner.predict_on(extract_f64_matrix(raw)?.view())?,
            None => self.inner.predict()?,
        };
        Ok(pred.to_pyarray(py))
    }

    /// Integrate the fitted (or given) model from `x0` over `t`.
    #[pyo3(signature = (x0, t, coefs = None), text_signature = "(self, x0, t, /, coefs=None)")]
    pub fn simulate<'py>(
        &self, py: Python<'py>, x0: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>,
        coefs: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let x0 = extract_f64_array(x0)?;
        let t = extract_f64_array(t)?;
        let coefs = coefs.map(extract_f64_matrix).transpose()?;
        let traj = self.inner.simulate(x0.view(), t.view(), coefs.as_ref())?;
        Ok(traj.to_pyarray(py))
    }

    pub fn print(&self) -> PyResult<()> {
        Ok(self.inner.print()?)
    }

    #[pyo3(signature = (precision = 3), text_signature = "(self, /, precision=3)")]
    pub fn equations(&self, precision: usize) -> PyResult<Vec<String>> {
        Ok(self.inner.equations(precision)?)
    }

    pub fn get_probabilities(&self) -> PyResult<Vec<Vec<f64>>> {
        Ok(self.inner.get_probabilities()?)
    }

    pub fn get_free_energies(&self) -> PyResult<Vec<Vec<f64>>> {
        Ok(self.inner.get_free_energies()?)
    }

    pub fn get_feature_combinations(&self) -> PyResult<Vec<Vec<String>>> {
        Ok(self.inner.get_feature_combinations()?)
    }

    #[getter]
    pub fn coefficients<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.coefficients()?.to_pyarray(py))
    }

    #[getter]
    pub fn variances<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        Ok(self.inner.variances()?.to_pyarray(py))
    }

    #[getter]
    pub fn feature_names(&self) -> PyResult<Vec<String>> {
        Ok(self.inner.feature_names()?)
    }

    fn __repr__(&self) -> String {
        let o = &self.inner.options;
        format!(
            "ZSindy(rho={}, lmbda={}, max_num_terms={}, poly_degree={}, fitted={})",
            o.rho,
            o.lmbda,
            o.max_num_terms,
            o.poly_degree,
            self.inner.fitted.is_some()
        )
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_zsindy<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(_py, "models")?;
    models(_py, m, &models_mod)?;

    // Register the submodule in sys.modules so `rust_zsindy.models` imports work.
    _py.import("sys")?.getattr("modules")?.set_item("rust_zsindy.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models<'py>(
    _py: Python, rust_zsindy: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ZSindy>()?;
    rust_zsindy.add_submodule(m)?;
    Ok(())
}
