//! core — data, features, enumeration, and evidence primitives for Z-SINDy.
//!
//! Purpose
//! -------
//! Collect the building blocks of exhaustive Bayesian subset search over a
//! candidate feature library: validated trajectories, fit options, feature
//! libraries, derivative estimators, subset enumeration, Gram-matrix
//! sufficient statistics with closed-form free energies, and the ODE
//! integrator used for simulation. The selector and model layers in
//! `discovery::models` build on these primitives.
//!
//! Key behaviors
//! -------------
//! - Validate raw inputs once ([`Trajectory`]) and configure fits
//!   ([`ZSindyOptions`], [`VarianceMode`]).
//! - Build the design matrix `Θ` through the [`FeatureLibrary`] capability
//!   ([`PolynomialLibrary`], [`FourierLibrary`]) and derivatives through the
//!   [`Differentiator`] capability ([`FiniteDifference`], [`Precomputed`]).
//! - Enumerate subsets lexicographically ([`Combinations`], [`Gamma`]).
//! - Score subsets in closed form against a shared [`Gram`] with an
//!   [`EvidenceScorer`], using Cholesky helpers from [`linalg`].
//! - Integrate autonomous systems on a fixed grid ([`RungeKutta4`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything here is pure computation on `ndarray`/`nalgebra` values; no
//!   logging or I/O happens at this layer.
//! - Feature ordering is canonical per configuration and is the single
//!   source of truth for coefficient column indices.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its closed forms, orderings, and
//!   rejection branches. End-to-end behavior is covered by the integration
//!   tests under `tests/`.

pub mod combinations;
pub mod data;
pub mod differentiation;
pub mod evidence;
pub mod integrate;
pub mod library;
pub mod linalg;
pub mod options;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::combinations::{Combinations, Gamma, enumerate_up_to};
pub use self::data::Trajectory;
pub use self::differentiation::{Differentiator, FiniteDifference, Precomputed};
pub use self::evidence::{CandidateScore, EvidenceScorer, Gram};
pub use self::integrate::{Integrator, Rhs, RungeKutta4};
pub use self::library::{FeatureLibrary, FourierLibrary, PolynomialLibrary};
pub use self::linalg::{SINGULAR_TOL, SpdFactor};
pub use self::options::{VarianceMode, ZSindyOptions, default_variable_names};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_zsindy::discovery::core::prelude::*;
//
// to import the main core surface in a single line.

pub mod prelude {
    pub use super::combinations::{Combinations, Gamma};
    pub use super::data::Trajectory;
    pub use super::differentiation::{Differentiator, FiniteDifference, Precomputed};
    pub use super::evidence::{EvidenceScorer, Gram};
    pub use super::integrate::{Integrator, RungeKutta4};
    pub use super::library::{FeatureLibrary, FourierLibrary, PolynomialLibrary};
    pub use super::options::{VarianceMode, ZSindyOptions};
}
