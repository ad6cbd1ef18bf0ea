//! models — model selection and the user-facing Z-SINDy model.
//!
//! Purpose
//! -------
//! Sit on top of `discovery::core` and turn its primitives into a complete
//! fit: the [`ModelSelector`] runs the exhaustive scoring and ranking, the
//! value types in [`fitted`] carry the outcome, and [`ZSindy`] exposes the
//! fit / predict / simulate / print surface with cached results.
//!
//! Key behaviors
//! -------------
//! - [`ModelSelector::select`] is a pure function of `(Θ, Ẋ, options)` and
//!   returns a [`FittedModel`] by value.
//! - [`ZSindy`] owns its collaborators and caches the last [`FittedModel`]
//!   and design matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only `ZSindy::fit*` mutates model state; every accessor returns
//!   `ZSindyError::NotFitted` until a fit succeeds.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`selector`] cover normalization, ranking, tie-breaks, and
//!   every `NoValidModel` branch; [`zsindy`] covers accessor gating and
//!   injected components; [`fitted`] pins the equation text format.

pub mod fitted;
pub mod selector;
pub mod zsindy;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::fitted::{DimensionFit, FittedModel, RankedCandidate};
pub use self::selector::ModelSelector;
pub use self::zsindy::ZSindy;

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::fitted::{DimensionFit, FittedModel, RankedCandidate};
    pub use super::selector::ModelSelector;
    pub use super::zsindy::ZSindy;
}
