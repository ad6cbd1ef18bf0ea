//! Python-boundary helpers: array extraction and option building for the
//! `_rust_zsindy` extension module.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use numpy::{PyReadonlyArray1, PyReadonlyArray2};

#[cfg(feature = "python-bindings")]
use crate::discovery::core::options::{VarianceMode, ZSindyOptions};

/// Copy a 1-D float64 input (ndarray, pandas Series, or sequence) into an
/// owned [`Array1`].
#[cfg(feature = "python-bindings")]
pub fn extract_f64_array<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array1<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            return Ok(series_ro.as_array().to_owned());
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(Array1::from(vec))
}

/// Copy a 2-D float64 input (ndarray, pandas DataFrame, or nested sequence,
/// rows = samples) into an owned [`Array2`].
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("rows of a 2-D input must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let n_rows = if n_cols == 0 { 0 } else { flat.len() / n_cols };
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(format!("could not shape input: {e}")))
}

/// Build validated [`ZSindyOptions`] from Python keyword arguments.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_options(
    rho: f64, lmbda: f64, max_num_terms: usize, poly_degree: usize,
    variable_names: Option<Vec<String>>, use_all_fe: Option<bool>, sort_all: Option<bool>,
    normalize_lambda: Option<bool>, variance_mode: Option<&str>,
) -> PyResult<ZSindyOptions> {
    let mode = match variance_mode {
        Some(name) => name.parse::<VarianceMode>()?,
        None => VarianceMode::Restricted,
    };
    let mut opts = ZSindyOptions::new(rho, lmbda, max_num_terms, poly_degree)?
        .with_use_all_fe(use_all_fe.unwrap_or(true))
        .with_sort_all(sort_all.unwrap_or(true))
        .with_normalize_lambda(normalize_lambda.unwrap_or(false))
        .with_variance_mode(mode);
    if let Some(names) = variable_names {
        opts = opts.with_variable_names(names);
    }
    Ok(opts)
}
