//! models::selector — exhaustive subset search, ranking, and selection.
//!
//! Purpose
//! -------
//! Drive the SCORE → RANK → SELECT phases of a fit. For every output
//! dimension, every subset of size `1..=max_num_terms` is scored against a
//! shared [`Gram`], penalized, normalized into probabilities, and the winner
//! is scattered into full-length coefficient and variance vectors.
//!
//! Key behaviors
//! -------------
//! - Size groups are scored in parallel with rayon; results are collected in
//!   enumeration order, so rankings do not depend on the thread count.
//! - Penalized free energy is `F + λ_eff · k`.
//! - Within each size group candidates are stably sorted by penalized `F`
//!   (the best-per-size view). The concatenated list is normalized by its
//!   minimum, then re-sorted globally when `sort_all` is set.
//! - Probabilities are `exp(−F_norm) / Σ exp(−F_norm)`, over all sizes when
//!   `use_all_fe` is set and within each size group otherwise.
//! - The winner minimizes penalized `F`; ties go to the smaller subset, then
//!   to the lexicographically smaller one.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`ZSindyError::SingularSubset`] is caught per candidate and never
//!   returned; any other scoring error aborts the fit.
//! - A dimension whose candidates are all singular yields
//!   [`ZSindyError::NoValidModel`], as do `max_num_terms == 0` and an empty
//!   library.
//!
//! Testing notes
//! -------------
//! - Unit tests check probability normalization under both `use_all_fe`
//!   settings, monotonicity of penalized `F` in `lmbda`, winner tie-breaks,
//!   ordering under `sort_all = false`, and every `NoValidModel` branch.
use crate::discovery::{
    core::{
        combinations::{Gamma, enumerate_up_to},
        evidence::{CandidateScore, EvidenceScorer, Gram},
        options::ZSindyOptions,
    },
    errors::{ZSindyError, ZSindyResult},
    models::fitted::{DimensionFit, FittedModel, RankedCandidate},
};
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use std::{cmp::Ordering, time::Instant};
use tracing::{debug, info, trace};

/// Runs the exhaustive evidence search for one set of options.
#[derive(Debug, Clone, Copy)]
pub struct ModelSelector<'a> {
    options: &'a ZSindyOptions,
}

impl<'a> ModelSelector<'a> {
    pub fn new(options: &'a ZSindyOptions) -> Self {
        ModelSelector { options }
    }

    /// Score, rank, and select a model for every column of `xdot`.
    ///
    /// Parameters
    /// ----------
    /// - `theta`: `T × n_f` design matrix.
    /// - `xdot`: `T × d` derivative matrix, row-aligned with `theta`.
    /// - `feature_names`: `n_f` labels in column order of `theta`.
    /// - `variable_names`: `d` labels in column order of `xdot`.
    ///
    /// Errors
    /// ------
    /// - [`ZSindyError::NoValidModel`] for `max_num_terms == 0`, `n_f == 0`,
    ///   or a dimension whose every candidate is singular.
    /// - [`ZSindyError::DimensionMismatch`] / [`ZSindyError::LengthMismatch`]
    ///   for inconsistent shapes or label counts.
    /// - [`ZSindyError::SingularLibrary`] under full-library variances when
    ///   `ΘᵀΘ` is singular.
    pub fn select(
        &self, theta: ArrayView2<'_, f64>, xdot: ArrayView2<'_, f64>, feature_names: Vec<String>,
        variable_names: Vec<String>,
    ) -> ZSindyResult<FittedModel> {
        let n_f = theta.ncols();
        let n_dims = xdot.ncols();
        if self.options.max_num_terms == 0 {
            return Err(ZSindyError::NoValidModel {
                dim: 0,
                reason: "max_num_terms must be at least 1",
            });
        }
        if n_f == 0 {
            return Err(ZSindyError::NoValidModel { dim: 0, reason: "feature library is empty" });
        }
        if feature_names.len() != n_f {
            return Err(ZSindyError::DimensionMismatch {
                expected: n_f,
                actual: feature_names.len(),
            });
        }
        if variable_names.len() != n_dims {
            return Err(ZSindyError::DimensionMismatch {
                expected: n_dims,
                actual: variable_names.len(),
            });
        }

        let started = Instant::now();
        let gram = Gram::new(theta, xdot)?;
        let scorer = EvidenceScorer::new(&gram, self.options.rho, self.options.variance_mode)?;
        let groups = enumerate_up_to(n_f, self.options.max_num_terms);
        let lambda_eff = self.options.effective_lambda(gram.n_samples);
        let n_candidates: usize = groups.iter().map(Vec::len).sum();

        info!(
            target: "rust_zsindy::selector",
            samples = gram.n_samples,
            variables = n_dims,
            features = n_f,
            candidates_per_dim = n_candidates,
            lambda_eff,
            "starting exhaustive subset search"
        );

        let mut dims = Vec::with_capacity(n_dims);
        for dim in 0..n_dims {
            let fit = self.select_dimension(&scorer, dim, &groups, lambda_eff, &feature_names)?;
            debug!(
                target: "rust_zsindy::selector",
                dim,
                winner = %fit.gamma,
                free_energy = fit.free_energy,
                singular = fit.n_singular,
                "dimension selected"
            );
            dims.push(fit);
        }

        let mut coefficients = Array2::<f64>::zeros((n_dims, n_f));
        let mut variances = Array2::<f64>::zeros((n_dims, n_f));
        for fit in &dims {
            coefficients.row_mut(fit.dim).assign(&fit.coefficients);
            variances.row_mut(fit.dim).assign(&fit.variances);
        }

        info!(
            target: "rust_zsindy::selector",
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            active_terms = coefficients.iter().filter(|&&c| c != 0.0).count(),
            "subset search finished"
        );

        Ok(FittedModel {
            dims,
            coefficients,
            variances,
            feature_names,
            variable_names,
            lambda_eff,
            n_samples: gram.n_samples,
        })
    }

    /// Score every enumerated subset for output `dim` and select the winner.
    ///
    /// `groups[s]` holds the subsets of size `s + 1`.
    pub fn select_dimension(
        &self, scorer: &EvidenceScorer<'_>, dim: usize, groups: &[Vec<Gamma>], lambda_eff: f64,
        feature_names: &[String],
    ) -> ZSindyResult<DimensionFit> {
        let mut n_singular = 0;
        let mut scored_groups: Vec<Vec<Scored>> = Vec::with_capacity(groups.len());

        for (s, group) in groups.iter().enumerate() {
            let results: Vec<ZSindyResult<CandidateScore>> =
                group.par_iter().map(|gamma| scorer.score(dim, gamma)).collect();

            let mut scored = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(score) => {
                        let penalized = score.free_energy + lambda_eff * score.gamma.len() as f64;
                        scored.push(Scored { score, penalized });
                    }
                    Err(ZSindyError::SingularSubset { .. }) => n_singular += 1,
                    Err(err) => return Err(err),
                }
            }
            scored.sort_by(|a, b| a.penalized.total_cmp(&b.penalized));
            trace!(
                target: "rust_zsindy::selector",
                dim,
                size = s + 1,
                scored = scored.len(),
                best = scored.first().map(|c| c.penalized),
                "size group scored"
            );
            scored_groups.push(scored);
        }

        let winner = scored_groups
            .iter()
            .flatten()
            .min_by(|a, b| winner_order(a, b))
            .ok_or(ZSindyError::NoValidModel {
                dim,
                reason: "every enumerated candidate was singular",
            })?;

        let n_f = scorer.n_features();
        let mut coefficients = Array1::<f64>::zeros(n_f);
        let mut variances = Array1::<f64>::zeros(n_f);
        for (j, &i) in winner.score.gamma.indices().iter().enumerate() {
            coefficients[i] = winner.score.coefficients[j];
            variances[i] = winner.score.variances[j];
        }
        let winner_gamma = winner.score.gamma.clone();
        let winner_free_energy = winner.penalized;

        let ranked_groups = self.normalize(&scored_groups, feature_names);
        let best_per_size: Vec<RankedCandidate> =
            ranked_groups.iter().filter_map(|g| g.first().cloned()).collect();
        let mut ranked: Vec<RankedCandidate> = ranked_groups.into_iter().flatten().collect();
        if self.options.sort_all {
            ranked.sort_by(|a, b| a.normalized_free_energy.total_cmp(&b.normalized_free_energy));
        }

        Ok(DimensionFit {
            dim,
            gamma: winner_gamma,
            coefficients,
            variances,
            free_energy: winner_free_energy,
            ranked,
            best_per_size,
            n_singular,
        })
    }

    /// Subtract minima and convert to probabilities, either across all groups
    /// or within each group. Group order and intra-group order are kept.
    fn normalize(
        &self, groups: &[Vec<Scored>], feature_names: &[String],
    ) -> Vec<Vec<RankedCandidate>> {
        let to_ranked = |group: &[Scored], min: f64, total: f64| -> Vec<RankedCandidate> {
            group
                .iter()
                .map(|c| {
                    let normalized = c.penalized - min;
                    RankedCandidate {
                        gamma: c.score.gamma.clone(),
                        label: c.score.gamma.label(feature_names),
                        size: c.score.gamma.len(),
                        free_energy: c.score.free_energy,
                        penalized_free_energy: c.penalized,
                        normalized_free_energy: normalized,
                        probability: (-normalized).exp() / total,
                    }
                })
                .collect()
        };

        if self.options.use_all_fe {
            let all: Vec<&Scored> = groups.iter().flatten().collect();
            let min = all.iter().map(|c| c.penalized).fold(f64::INFINITY, f64::min);
            let total: f64 = all.iter().map(|c| (-(c.penalized - min)).exp()).sum();
            groups.iter().map(|g| to_ranked(g, min, total)).collect()
        } else {
            groups
                .iter()
                .map(|g| {
                    let min = g.iter().map(|c| c.penalized).fold(f64::INFINITY, f64::min);
                    let total: f64 = g.iter().map(|c| (-(c.penalized - min)).exp()).sum();
                    to_ranked(g, min, total)
                })
                .collect()
        }
    }
}

// ---- Helper methods ----

/// A successfully scored candidate with its penalized free energy.
#[derive(Debug, Clone)]
struct Scored {
    score: CandidateScore,
    penalized: f64,
}

/// Minimal penalized `F`, then smaller size, then lexicographic `γ`.
fn winner_order(a: &Scored, b: &Scored) -> Ordering {
    a.penalized
        .total_cmp(&b.penalized)
        .then_with(|| a.score.gamma.len().cmp(&b.score.gamma.len()))
        .then_with(|| a.score.gamma.cmp(&b.score.gamma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::core::{
        library::{FeatureLibrary, PolynomialLibrary},
        options::ZSindyOptions,
    };
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Probability normalization (global and per size group).
    // - Penalty monotonicity and winner tie-breaking.
    // - `sort_all = false` ordering and `best_per_size`.
    // - `NoValidModel` branches: zero depth, empty library, all singular.
    //
    // Data: exact derivatives of x = e^{−t/2}, i.e. ẋ = −0.5 x, on a
    // polynomial library in one variable.
    // -------------------------------------------------------------------------

    fn decay_problem() -> (Array2<f64>, Array2<f64>, Vec<String>) {
        let n = 200;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| (-0.5 * i as f64 * 0.01).exp());
        let xdot = x.mapv(|v| -0.5 * v);
        let lib = PolynomialLibrary::new(vec!["x".to_string()], 3, true);
        let theta = lib.transform(x.view()).unwrap();
        (theta, xdot, lib.names())
    }

    fn run(opts: &ZSindyOptions) -> ZSindyResult<FittedModel> {
        let (theta, xdot, names) = decay_problem();
        ModelSelector::new(opts).select(theta.view(), xdot.view(), names, vec!["x".to_string()])
    }

    #[test]
    // Purpose
    // -------
    // Probabilities form a distribution and the true term wins.
    //
    // Given
    // -----
    // - ẋ = −0.5 x exactly; library {1, x, x^2, x^3}; max_num_terms = 2.
    //
    // Expect
    // ------
    // - Σp = 1 within 1e-9, all p ≥ 0, winner γ = {x} with β ≈ −0.5, and
    //   the top-ranked candidate has normalized F = 0.
    fn probabilities_sum_to_one_and_true_term_wins() {
        let opts = ZSindyOptions::new(0.01, 1.0, 2, 3).unwrap();

        let fitted = run(&opts).unwrap();
        let dim = &fitted.dims[0];

        let total: f64 = dim.ranked.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(dim.ranked.iter().all(|c| c.probability >= 0.0));
        assert_eq!(dim.gamma.indices(), &[1]);
        assert!((fitted.coefficients[[0, 1]] + 0.5).abs() < 1e-8);
        assert_eq!(dim.ranked[0].normalized_free_energy, 0.0);
        assert_eq!(dim.ranked.len(), 4 + 6);
    }

    #[test]
    // Purpose
    // -------
    // Penalized F grows with lmbda for every candidate.
    //
    // Given
    // -----
    // - Two fits with lmbda = 0 and lmbda = 5.
    //
    // Expect
    // ------
    // - For each label, penalized F difference equals 5 · size.
    fn penalized_free_energy_is_monotone_in_lambda() {
        let low = run(&ZSindyOptions::new(0.05, 0.0, 2, 3).unwrap()).unwrap();
        let high = run(&ZSindyOptions::new(0.05, 5.0, 2, 3).unwrap()).unwrap();

        for c in &low.dims[0].ranked {
            let other = high.dims[0].ranked.iter().find(|o| o.label == c.label).unwrap();
            assert!(other.penalized_free_energy >= c.penalized_free_energy);
            let diff = other.penalized_free_energy - c.penalized_free_energy;
            assert!((diff - 5.0 * c.size as f64).abs() < 1e-6 * diff.abs().max(1.0));
        }
    }

    #[test]
    fn per_group_normalization_sums_to_one_within_each_size() {
        let opts = ZSindyOptions::new(0.05, 0.0, 3, 3).unwrap().with_use_all_fe(false);

        let fitted = run(&opts).unwrap();

        for size in 1..=3 {
            let total: f64 = fitted.dims[0]
                .ranked
                .iter()
                .filter(|c| c.size == size)
                .map(|c| c.probability)
                .sum();
            assert!((total - 1.0).abs() < 1e-9, "size {size}: {total}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Without `sort_all`, ranked output stays grouped by size.
    //
    // Given
    // -----
    // - max_num_terms = 3, sort_all = false.
    //
    // Expect
    // ------
    // - Sizes are non-decreasing along the ranked list; each group is sorted
    //   by normalized F; `best_per_size` heads each group.
    fn unsorted_ranking_keeps_size_groups() {
        let opts = ZSindyOptions::new(0.05, 0.0, 3, 3).unwrap().with_sort_all(false);

        let fitted = run(&opts).unwrap();
        let ranked = &fitted.dims[0].ranked;

        assert!(ranked.windows(2).all(|w| w[0].size <= w[1].size));
        assert!(ranked.windows(2).all(|w| {
            w[0].size != w[1].size || w[0].normalized_free_energy <= w[1].normalized_free_energy
        }));
        let best = &fitted.dims[0].best_per_size;
        assert_eq!(best.len(), 3);
        for b in best {
            let head = ranked.iter().find(|c| c.size == b.size).unwrap();
            assert_eq!(head.label, b.label);
        }
    }

    #[test]
    fn winner_ties_break_by_size_then_gamma() {
        let mk = |idx: Vec<usize>, penalized: f64| Scored {
            score: CandidateScore {
                dim: 0,
                gamma: Gamma::new(idx).unwrap(),
                free_energy: penalized,
                coefficients: Array1::zeros(1),
                variances: Array1::zeros(1),
            },
            penalized,
        };
        let pool = [mk(vec![0, 2], 1.0), mk(vec![1], 1.0), mk(vec![0], 1.0), mk(vec![3], 2.0)];

        let winner = pool.iter().min_by(|a, b| winner_order(a, b)).unwrap();

        assert_eq!(winner.score.gamma.indices(), &[0]);
    }

    #[test]
    // Purpose
    // -------
    // Every `NoValidModel` branch is reachable.
    //
    // Given
    // -----
    // - max_num_terms = 0; an empty library; a library of two identical
    //   zero columns (every subset singular).
    //
    // Expect
    // ------
    // - `NoValidModel` in all three cases.
    fn no_valid_model_branches() {
        let opts = ZSindyOptions::new(0.1, 0.0, 0, 2).unwrap();
        assert!(matches!(run(&opts), Err(ZSindyError::NoValidModel { .. })));

        let opts = ZSindyOptions::new(0.1, 0.0, 2, 2).unwrap();
        let selector = ModelSelector::new(&opts);
        let xdot = array![[1.0], [2.0], [3.0]];

        let empty = Array2::<f64>::zeros((3, 0));
        let err = selector.select(empty.view(), xdot.view(), Vec::new(), vec!["x".to_string()]);
        assert!(matches!(err, Err(ZSindyError::NoValidModel { dim: 0, .. })));

        let zeros = Array2::<f64>::zeros((3, 2));
        let names = vec!["a".to_string(), "b".to_string()];
        let err = selector.select(zeros.view(), xdot.view(), names, vec!["x".to_string()]);
        assert_eq!(
            err.unwrap_err(),
            ZSindyError::NoValidModel { dim: 0, reason: "every enumerated candidate was singular" }
        );
    }

    #[test]
    fn singular_candidates_are_excluded_and_counted() {
        // Columns 0 and 1 are identical, so {0, 1} and every superset is singular.
        let theta = array![[1.0, 1.0, 0.0], [2.0, 2.0, 1.0], [3.0, 3.0, 0.5], [4.0, 4.0, 2.0]];
        let xdot = array![[1.0], [2.0], [3.0], [4.0]];
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let opts = ZSindyOptions::new(0.1, 0.0, 3, 1).unwrap();

        let fitted = ModelSelector::new(&opts)
            .select(theta.view(), xdot.view(), names, vec!["x".to_string()])
            .unwrap();

        let dim = &fitted.dims[0];
        assert_eq!(dim.n_singular, 2);
        assert_eq!(dim.ranked.len(), 7 - 2);
        assert!(dim.ranked.iter().all(|c| c.label != "a, b"));
    }
}
