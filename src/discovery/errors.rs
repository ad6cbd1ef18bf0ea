//! Errors for Z-SINDy model discovery (configuration, trajectory validation,
//! candidate scoring, model selection, and fitted-state access).
//!
//! This module defines the crate-wide error type, [`ZSindyError`], used across
//! the Rust core, the experiment harness, and the optional Python bindings. It
//! implements `Display`/`Error` and converts to `PyErr` when the
//! `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (rows are samples, columns are state variables).
//! - `dim` always refers to the output dimension (state variable) being fitted.
//! - [`ZSindyError::SingularSubset`] is a *recoverable* scoring error: the
//!   model selector catches it per candidate and excludes that candidate. It
//!   never escapes [`crate::discovery::models::selector::ModelSelector`].
//! - Every other variant propagates to the caller of `fit`/`predict` and
//!   names the failing dimension where one exists.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Crate-wide result alias for model-discovery operations.
pub type ZSindyResult<T> = Result<T, ZSindyError>;

/// Unified error type for Z-SINDy model discovery.
///
/// Covers configuration checks, trajectory validation, per-candidate scoring
/// failures, selection failures, and fitted-state access. Implements
/// `Display`/`Error` and converts to a Python `ValueError` at PyO3 boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum ZSindyError {
    // ---- Configuration ----
    /// Number of state columns does not match the configured variable count.
    DimensionMismatch { expected: usize, actual: usize },

    /// Noise scale rho must be finite and > 0.
    InvalidRho { value: f64 },

    /// Sparsity penalty lambda must be finite and >= 0.
    InvalidLambda { value: f64 },

    /// Fourier library needs at least one frequency.
    InvalidFrequencies { value: usize },

    /// Integration grid or step is unusable.
    InvalidTimeGrid { reason: &'static str },

    /// Unknown variance-mode name.
    InvalidVarianceMode { name: String, reason: &'static str },

    // ---- Trajectory validation ----
    /// Trajectory has no samples or no state columns.
    EmptyTrajectory,

    /// Sample count of the state matrix and the time vector differ.
    LengthMismatch { states: usize, times: usize },

    /// A state or time value is NaN/±inf.
    NonFiniteData { row: usize, col: usize, value: f64 },

    /// Time stamps must be strictly increasing.
    NonIncreasingTime { index: usize },

    /// Differentiation needs more samples than were provided.
    InsufficientSamples { required: usize, actual: usize },

    // ---- Candidate scoring ----
    /// Restricted Gram submatrix C[gamma, gamma] is singular or ill-conditioned.
    SingularSubset { dim: usize, gamma: Vec<usize> },

    /// Full Gram matrix C is singular (only raised under full-library variance).
    SingularLibrary,

    // ---- Selection ----
    /// No enumerated candidate produced a valid model for this dimension.
    NoValidModel { dim: usize, reason: &'static str },

    // ---- Fitted state ----
    /// Accessed fit results before a successful `fit`.
    NotFitted,

    // ---- Experiments ----
    /// Sweep inputs are inconsistent.
    InvalidSweep { reason: String },
}

impl std::error::Error for ZSindyError {}

impl std::fmt::Display for ZSindyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            ZSindyError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Configuration error: expected {expected} state variables, got {actual} columns"
                )
            }
            ZSindyError::InvalidRho { value } => {
                write!(f, "Noise scale rho must be finite and > 0; got: {value}")
            }
            ZSindyError::InvalidLambda { value } => {
                write!(f, "Sparsity penalty lambda must be finite and >= 0; got: {value}")
            }
            ZSindyError::InvalidFrequencies { value } => {
                write!(f, "Fourier library needs at least one frequency; got: {value}")
            }
            ZSindyError::InvalidTimeGrid { reason } => {
                write!(f, "Invalid time grid: {reason}")
            }
            ZSindyError::InvalidVarianceMode { name, reason } => {
                write!(f, "Invalid variance mode {name:?}. {reason}")
            }
            // ---- Trajectory validation ----
            ZSindyError::EmptyTrajectory => {
                write!(f, "Trajectory is empty.")
            }
            ZSindyError::LengthMismatch { states, times } => {
                write!(f, "Trajectory has {states} state samples but {times} time stamps")
            }
            ZSindyError::NonFiniteData { row, col, value } => {
                write!(f, "Value at row {row}, column {col} is non-finite: {value}")
            }
            ZSindyError::NonIncreasingTime { index } => {
                write!(f, "Time stamps must be strictly increasing; violated at index {index}")
            }
            ZSindyError::InsufficientSamples { required, actual } => {
                write!(f, "At least {required} samples are required; got {actual}")
            }
            // ---- Candidate scoring ----
            ZSindyError::SingularSubset { dim, gamma } => {
                write!(f, "Gram submatrix for dimension {dim}, features {gamma:?} is singular")
            }
            ZSindyError::SingularLibrary => {
                write!(f, "Full library Gram matrix is singular; full-library variance unavailable")
            }
            // ---- Selection ----
            ZSindyError::NoValidModel { dim, reason } => {
                write!(f, "No valid model for dimension {dim}: {reason}")
            }
            // ---- Fitted state ----
            ZSindyError::NotFitted => {
                write!(f, "No fitted model: call fit() first.")
            }
            // ---- Experiments ----
            ZSindyError::InvalidSweep { reason } => {
                write!(f, "Invalid sweep configuration: {reason}")
            }
        }
    }
}

/// Convert a [`ZSindyError`] into a Python `ValueError` with the error message.
///
/// This is used at the Rust↔Python boundary to surface domain errors cleanly.
#[cfg(feature = "python-bindings")]
impl std::convert::From<ZSindyError> for PyErr {
    fn from(err: ZSindyError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
