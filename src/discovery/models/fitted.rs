//! models::fitted — value types produced by a Z-SINDy fit.
//!
//! Purpose
//! -------
//! Hold everything a fit discovers in plain, owned values: per-dimension
//! winners, ranked candidate lists with probabilities, the aggregate sparse
//! coefficient and variance matrices, and the labels needed to render
//! equations. The model interface caches a [`FittedModel`]; nothing here
//! borrows from the fit inputs.
//!
//! Key behaviors
//! -------------
//! - [`RankedCandidate`] records raw, penalized, and normalized free energies
//!   plus the probability of one subset.
//! - [`DimensionFit`] is the outcome for one state variable.
//! - [`FittedModel`] aggregates dimensions, exposes the ranked views used by
//!   `get_probabilities` / `get_free_energies` / `get_feature_combinations`,
//!   and renders equations (`Display` prints them one per line).
//!
//! Conventions
//! -----------
//! - `coefficients` and `variances` are `d × n_f`; row `i` is the equation of
//!   state variable `i`, column `j` is feature `j` of the library.
//! - Entries outside the selected subset are exactly zero.
use crate::discovery::core::combinations::Gamma;
use ndarray::{Array1, Array2};
use std::fmt;

/// One scored subset after ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub gamma: Gamma,
    /// Feature names of `gamma` joined by `", "`.
    pub label: String,
    pub size: usize,
    /// Free energy before the sparsity penalty.
    pub free_energy: f64,
    /// `free_energy + λ_eff · size`.
    pub penalized_free_energy: f64,
    /// Penalized free energy minus the minimum of its normalization group.
    pub normalized_free_energy: f64,
    pub probability: f64,
}

/// Selection outcome for one output dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionFit {
    pub dim: usize,
    /// Winning subset.
    pub gamma: Gamma,
    /// Full-length (`n_f`) coefficients, zero outside `gamma`.
    pub coefficients: Array1<f64>,
    /// Full-length (`n_f`) variances, zero outside `gamma`.
    pub variances: Array1<f64>,
    /// Penalized free energy of the winner.
    pub free_energy: f64,
    /// All non-singular candidates in ranked order.
    pub ranked: Vec<RankedCandidate>,
    /// Best candidate of each non-empty size group, size ascending.
    pub best_per_size: Vec<RankedCandidate>,
    /// Number of candidates excluded as singular.
    pub n_singular: usize,
}

impl DimensionFit {
    /// Probability of the candidate with the given label, if ranked.
    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.ranked.iter().find(|c| c.label == label).map(|c| c.probability)
    }

    /// 0-based rank of the candidate with the given label, ordered by
    /// normalized free energy.
    pub fn rank_of(&self, label: &str) -> Option<usize> {
        let target = self.ranked.iter().find(|c| c.label == label)?;
        Some(
            self.ranked
                .iter()
                .filter(|c| c.normalized_free_energy < target.normalized_free_energy)
                .count(),
        )
    }
}

/// Result of a full fit across all dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub dims: Vec<DimensionFit>,
    /// `d × n_f` sparse coefficients.
    pub coefficients: Array2<f64>,
    /// `d × n_f` coefficient variances.
    pub variances: Array2<f64>,
    pub feature_names: Vec<String>,
    pub variable_names: Vec<String>,
    /// Penalty actually applied per term.
    pub lambda_eff: f64,
    pub n_samples: usize,
}

impl FittedModel {
    pub fn n_dimensions(&self) -> usize {
        self.dims.len()
    }

    pub fn dimension(&self, dim: usize) -> Option<&DimensionFit> {
        self.dims.get(dim)
    }

    /// Per-dimension probabilities in ranked order.
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.dims.iter().map(|d| d.ranked.iter().map(|c| c.probability).collect()).collect()
    }

    /// Per-dimension normalized free energies in ranked order.
    pub fn free_energies(&self) -> Vec<Vec<f64>> {
        self.dims
            .iter()
            .map(|d| d.ranked.iter().map(|c| c.normalized_free_energy).collect())
            .collect()
    }

    /// Per-dimension candidate labels in ranked order.
    pub fn feature_combinations(&self) -> Vec<Vec<String>> {
        self.dims.iter().map(|d| d.ranked.iter().map(|c| c.label.clone()).collect()).collect()
    }

    /// Number of non-zero coefficients across all equations.
    pub fn n_active_terms(&self) -> usize {
        self.coefficients.iter().filter(|&&c| c != 0.0).count()
    }

    /// Render one equation per dimension, e.g. `(x)' = -0.500 x + 2.000 x*y`.
    ///
    /// Terms appear in library order; an equation without terms reads `0`.
    pub fn equations(&self, precision: usize) -> Vec<String> {
        self.coefficients
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let name = self.variable_names.get(i).map(String::as_str).unwrap_or("?");
                format!("({name})' = {}", format_rhs(row.iter(), &self.feature_names, precision))
            })
            .collect()
    }
}

impl fmt::Display for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.equations(3) {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

// ---- Helper methods ----

fn format_rhs<'a>(
    coefs: impl Iterator<Item = &'a f64>, feature_names: &[String], precision: usize,
) -> String {
    let mut out = String::new();
    for (j, &c) in coefs.enumerate() {
        if c == 0.0 {
            continue;
        }
        let name = feature_names.get(j).map(String::as_str).unwrap_or("?");
        if out.is_empty() {
            out.push_str(&format!("{c:.precision$} {name}"));
        } else {
            let sign = if c < 0.0 { '-' } else { '+' };
            out.push_str(&format!(" {sign} {:.precision$} {name}", c.abs()));
        }
    }
    if out.is_empty() { "0".to_string() } else { out }
}
