//! Z-SINDy options — configuration for the exhaustive evidence search.
//!
//! Purpose
//! -------
//! Collect every configuration knob of a fit in one validated value so that
//! the selector, the library, and the Python facade agree on defaults. This
//! includes the noise scale `rho`, the sparsity penalty `lmbda`, the search
//! depth `max_num_terms`, the polynomial degree, display labels, and the
//! ranking/normalization switches.
//!
//! Key behaviors
//! -------------
//! - [`ZSindyOptions::new`] validates the numeric fields (`rho > 0`,
//!   `lmbda ≥ 0`, both finite) and fills the remaining fields with defaults.
//! - `with_*` builders set the remaining switches without further checks.
//! - [`ZSindyOptions::effective_lambda`] resolves the per-term penalty,
//!   optionally rescaled by `N · rho²` so its relative weight does not depend
//!   on dataset size.
//! - [`VarianceMode`] selects how coefficient variances are derived and
//!   parses case-insensitively from strings.
//!
//! Invariants & assumptions
//! ------------------------
//! - `rho` is finite and strictly positive; `lmbda` is finite and
//!   non-negative. Both are enforced at construction.
//! - `max_num_terms == 0` is representable on purpose: the selector rejects it
//!   with `NoValidModel` instead of returning an empty model.
//!
//! Testing notes
//! -------------
//! - Unit tests verify validation branches, default values, penalty
//!   normalization, and `VarianceMode` parsing.
use crate::discovery::errors::{ZSindyError, ZSindyResult};
use std::str::FromStr;

/// How per-coefficient posterior variances are computed for a chosen subset.
///
/// Variants:
/// - `Restricted`: `rho² · diag(C[γ,γ]⁻¹)`, the posterior variance of the
///   restricted linear-Gaussian model (default).
/// - `FullLibrary`: `rho² · diag(C⁻¹)[γ]`, read from the inverse of the full
///   library Gram matrix.
///
/// Parsing:
/// Accepts case-insensitive `"restricted"` and `"full"` / `"full_library"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarianceMode {
    #[default]
    Restricted,
    FullLibrary,
}

impl FromStr for VarianceMode {
    type Err = ZSindyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "restricted" => Ok(VarianceMode::Restricted),
            "full" | "full_library" | "fulllibrary" => Ok(VarianceMode::FullLibrary),
            _ => Err(ZSindyError::InvalidVarianceMode {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'restricted' or 'full'.",
            }),
        }
    }
}

/// ZSindyOptions — fit-time configuration for Z-SINDy.
///
/// Purpose
/// -------
/// Bundle the hyperparameters of the Bayesian subset search.
///
/// Fields
/// ------
/// - `rho`: `f64`
///   Noise scale of the Gaussian likelihood on derivative samples.
/// - `lmbda`: `f64`
///   Additive per-term sparsity penalty on the free energy.
/// - `max_num_terms`: `usize`
///   Largest subset size enumerated (search depth).
/// - `poly_degree`: `usize`
///   Degree of the default polynomial feature library.
/// - `variable_names`: `Option<Vec<String>>`
///   Display labels for the state variables. When `None`, labels are
///   generated from the data dimension (`x, y, z, x3, x4, …`).
/// - `use_all_fe`: `bool`
///   Normalize free energies and probabilities over all sizes jointly (`true`)
///   or within each size group (`false`).
/// - `sort_all`: `bool`
///   Rank the concatenated candidate list globally (`true`) or keep it
///   grouped by size (`false`).
/// - `normalize_lambda`: `bool`
///   Rescale `lmbda` by `N · rho²`.
/// - `variance_mode`: [`VarianceMode`]
///   Variance derivation for the selected subset.
///
/// Invariants
/// ----------
/// - `rho` finite and > 0; `lmbda` finite and ≥ 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ZSindyOptions {
    pub rho: f64,
    pub lmbda: f64,
    pub max_num_terms: usize,
    pub poly_degree: usize,
    pub variable_names: Option<Vec<String>>,
    pub use_all_fe: bool,
    pub sort_all: bool,
    pub normalize_lambda: bool,
    pub variance_mode: VarianceMode,
}

impl ZSindyOptions {
    /// Construct validated options with default switches.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidRho`] if `rho` is not finite or `rho <= 0`.
    /// - [`ZSindyError::InvalidLambda`] if `lmbda` is not finite or negative.
    pub fn new(
        rho: f64, lmbda: f64, max_num_terms: usize, poly_degree: usize,
    ) -> ZSindyResult<Self> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ZSindyError::InvalidRho { value: rho });
        }
        if !lmbda.is_finite() || lmbda < 0.0 {
            return Err(ZSindyError::InvalidLambda { value: lmbda });
        }
        Ok(ZSindyOptions {
            rho,
            lmbda,
            max_num_terms,
            poly_degree,
            variable_names: None,
            use_all_fe: true,
            sort_all: true,
            normalize_lambda: false,
            variance_mode: VarianceMode::Restricted,
        })
    }

    pub fn with_variable_names<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        self.variable_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_use_all_fe(mut self, use_all_fe: bool) -> Self {
        self.use_all_fe = use_all_fe;
        self
    }

    pub fn with_sort_all(mut self, sort_all: bool) -> Self {
        self.sort_all = sort_all;
        self
    }

    pub fn with_normalize_lambda(mut self, normalize_lambda: bool) -> Self {
        self.normalize_lambda = normalize_lambda;
        self
    }

    pub fn with_variance_mode(mut self, variance_mode: VarianceMode) -> Self {
        self.variance_mode = variance_mode;
        self
    }

    /// Per-term penalty actually added to the free energy.
    ///
    /// Returns `lmbda`, or `lmbda · n_samples · rho²` when
    /// `normalize_lambda` is set.
    pub fn effective_lambda(&self, n_samples: usize) -> f64 {
        if self.normalize_lambda {
            self.lmbda * n_samples as f64 * self.rho * self.rho
        } else {
            self.lmbda
        }
    }

    /// Resolve display labels for `n_variables` state columns.
    ///
    /// Uses the configured names when present (their count is checked later
    /// by the library), otherwise `x, y, z` followed by `x3, x4, …`.
    pub fn resolve_variable_names(&self, n_variables: usize) -> Vec<String> {
        match &self.variable_names {
            Some(names) => names.clone(),
            None => default_variable_names(n_variables),
        }
    }
}

impl Default for ZSindyOptions {
    fn default() -> Self {
        ZSindyOptions {
            rho: 0.1,
            lmbda: 0.0,
            max_num_terms: 3,
            poly_degree: 2,
            variable_names: None,
            use_all_fe: true,
            sort_all: true,
            normalize_lambda: false,
            variance_mode: VarianceMode::Restricted,
        }
    }
}

/// Default state labels: `x, y, z`, then `x3, x4, …`.
pub fn default_variable_names(n_variables: usize) -> Vec<String> {
    const BASE: [&str; 3] = ["x", "y", "z"];
    (0..n_variables)
        .map(|i| if i < BASE.len() { BASE[i].to_string() } else { format!("x{i}") })
        .collect()
}
