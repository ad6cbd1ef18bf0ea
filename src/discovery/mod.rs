//! discovery — Bayesian sparse model discovery (Z-SINDy).
//!
//! Purpose
//! -------
//! Identify, for each state variable of a sampled dynamical system, the
//! smallest set of candidate terms that explains its time derivative. Every
//! subset of a feature library up to `max_num_terms` terms is scored by a
//! closed-form free energy (negative log marginal likelihood of a
//! linear-Gaussian model), penalized per term, and ranked; the winner per
//! dimension forms a sparse coefficient matrix.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds data validation, options, feature libraries,
//!   differentiators, subset enumeration, evidence scoring, and integration.
//! - [`models`] holds the [`ModelSelector`], the [`FittedModel`] value types,
//!   and the stateful [`ZSindy`] model.
//! - [`errors`] defines [`ZSindyError`] and [`ZSindyResult`] for the whole
//!   crate.
//!
//! Invariants & assumptions
//! ------------------------
//! - The search is exhaustive and deterministic: identical inputs and options
//!   give identical rankings, independent of the rayon thread count.
//! - Singular candidate subsets are excluded from ranking rather than failing
//!   the fit; a dimension with no valid candidate fails with
//!   `ZSindyError::NoValidModel`.
//!
//! Conventions
//! -----------
//! - Arrays follow the NumPy layout: samples in rows, variables or features
//!   in columns. Coefficient matrices are `d × n_f`.
//! - Structured diagnostics go through `tracing` under the
//!   `rust_zsindy::*` targets; the crate never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! - Build [`ZSindyOptions`], construct [`ZSindy::new`], call `fit(x, t)`,
//!   then read `coefficients()`, `get_probabilities()`, `equations(3)`, or
//!   `simulate(x0, t, None)`.
//! - Custom bases or derivative estimators plug in through
//!   [`ZSindy::with_components`].
//!
//! Testing notes
//! -------------
//! - Submodules carry unit tests; `tests/integration_zsindy_pipeline.rs`
//!   exercises recovery, determinism, and simulation end to end.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------
//
// These are the "everyday" types most users need. Lower-level items
// (linear-algebra helpers, enumeration internals) remain under their
// submodules.

pub use self::core::{
    CandidateScore, Combinations, Differentiator, EvidenceScorer, FeatureLibrary,
    FiniteDifference, FourierLibrary, Gamma, Gram, Integrator, PolynomialLibrary, Precomputed,
    RungeKutta4, Trajectory, VarianceMode, ZSindyOptions,
};

pub use self::errors::{ZSindyError, ZSindyResult};

pub use self::models::{DimensionFit, FittedModel, ModelSelector, RankedCandidate, ZSindy};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_zsindy::discovery::prelude::*;
//
// to import the main discovery surface in a single line.

pub mod prelude {
    pub use super::{
        Differentiator, FeatureLibrary, FiniteDifference, FittedModel, FourierLibrary, Integrator,
        PolynomialLibrary, Precomputed, RungeKutta4, Trajectory, VarianceMode, ZSindy,
        ZSindyError, ZSindyOptions, ZSindyResult,
    };
}
