//! systems — reference dynamical systems with known sparse dynamics.
//!
//! Purpose
//! -------
//! Generate trajectories from systems whose governing terms are known, for
//! recovery tests and for the phase-diagram sweeps in `experiments`.
//!
//! Key behaviors
//! -------------
//! - [`PolynomialSystem`] stores a coefficient matrix over a
//!   [`crate::discovery::core::library::PolynomialLibrary`] and integrates it
//!   with RK4.
//! - `true_feature_labels()` yields the per-dimension labels that a correct
//!   fit ranks first.

pub mod polynomial;

pub use self::polynomial::PolynomialSystem;
