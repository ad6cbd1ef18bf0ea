//! Experiments — phase-diagram sweeps for Z-SINDy.
//!
//! Purpose
//! -------
//! Study how model selection behaves across noise levels, sparsity
//! penalties, and amounts of data. A [`PhaseDiagram`] fits one model per
//! point of a [`SweepInputs`] grid and turns the results into 2-D matrices
//! (set size, probability and rank of the true model, simulation accuracy)
//! ready for plotting.
//!
//! Key behaviors
//! -------------
//! - Sweeps are reproducible: noise comes from a seeded `StdRng`.
//! - Grid points are fitted in parallel with rayon; result order follows
//!   [`SweepInputs::index_combinations`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the grids (`inputs`) and the sweep itself
//!   (`phase_diagram`) and use the reference systems in `crate::systems`.
pub mod inputs;
pub mod phase_diagram;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::inputs::{SweepInputs, SweepKey};
pub use self::phase_diagram::{
    AxisTicks, DEFAULT_DIVERGENCE_THRESHOLD, DEFAULT_HORIZON, PhaseDiagram, SweepPoint,
    SweepResults, find_divergence_index,
};
