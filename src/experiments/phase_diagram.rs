//! experiments::phase_diagram — parameter sweeps and phase-diagram matrices.
//!
//! Purpose
//! -------
//! Run Z-SINDy over a grid of noise levels, sparsity penalties, data ratios,
//! and (optionally) likelihood noise scales, then project the per-point
//! results onto a 2-D grid spanned by two chosen sweep keys.
//!
//! Key behaviors
//! -------------
//! - [`PhaseDiagram::sweep_params`] fits one model per grid point on a
//!   truncated, noise-corrupted copy of the trajectory. Noise is drawn from a
//!   `StdRng` seeded with `seed + point index`, so sweeps are reproducible and
//!   grid points can be fitted in parallel.
//! - With accuracy enabled, the fitted model is simulated from the clean
//!   initial state and compared against the clean trajectory over a fixed
//!   horizon.
//! - `build_diag_*` turn a [`SweepResults`] into matrices indexed
//!   `[y, x]`, flipped so the largest y value is the first row.
//!
//! Conventions
//! -----------
//! - When several grid points map to the same `(y, x)` cell (other keys have
//!   more than one value), the last point in index order wins.
//! - Tick labels use `{:.1e}`; y ticks are listed top row first.
use crate::discovery::{
    core::{data::Trajectory, options::ZSindyOptions},
    errors::{ZSindyError, ZSindyResult},
    models::zsindy::ZSindy,
};
use crate::experiments::inputs::{SweepInputs, SweepKey};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Default number of samples compared in the accuracy check.
pub const DEFAULT_HORIZON: usize = 2000;
/// Default absolute deviation that marks a simulated trajectory as diverged.
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 0.01;

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Grid indices, aligned with [`SweepResults::keys`].
    pub index: Vec<usize>,
    pub eta: f64,
    pub lmbda: f64,
    pub dataratio: f64,
    pub rho: f64,
    /// Samples used for the fit.
    pub n_samples: usize,
    pub probabilities: Vec<Vec<f64>>,
    pub free_energies: Vec<Vec<f64>>,
    pub feature_combinations: Vec<Vec<String>>,
    pub coefficients: Array2<f64>,
    /// Spectral norm of the simulation error, when accuracy is enabled.
    pub accuracy: Option<f64>,
    /// Per-dimension divergence index, when accuracy is enabled.
    pub divergence: Option<Vec<usize>>,
}

/// All grid points of a sweep, in [`SweepInputs::index_combinations`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults {
    pub keys: Vec<SweepKey>,
    pub points: Vec<SweepPoint>,
}

/// Tick labels of a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTicks {
    pub x: Vec<String>,
    /// Top row first (descending grid order).
    pub y: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AccuracySettings {
    horizon: usize,
    threshold: f64,
}

/// Parameter sweep over one reference trajectory.
#[derive(Debug, Clone)]
pub struct PhaseDiagram {
    trajectory: Trajectory,
    inputs: SweepInputs,
    max_num_terms: usize,
    poly_degree: usize,
    variable_names: Vec<String>,
    x_variable: SweepKey,
    y_variable: SweepKey,
    accuracy: Option<AccuracySettings>,
    true_features: Option<Vec<String>>,
    seed: u64,
}

impl PhaseDiagram {
    /// # Errors
    /// - Trajectory validation errors for `(x, t)`.
    /// - [`ZSindyError::DimensionMismatch`] when `variable_names` does not
    ///   match the columns of `x`.
    /// - [`ZSindyError::InvalidSweep`] when the axes coincide or name a key
    ///   absent from `inputs`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: Array2<f64>, t: Array1<f64>, inputs: SweepInputs, max_num_terms: usize,
        poly_degree: usize, variable_names: Vec<String>, x_variable: SweepKey,
        y_variable: SweepKey,
    ) -> ZSindyResult<Self> {
        let trajectory = Trajectory::new(x, t)?;
        if variable_names.len() != trajectory.n_variables() {
            return Err(ZSindyError::DimensionMismatch {
                expected: trajectory.n_variables(),
                actual: variable_names.len(),
            });
        }
        if x_variable == y_variable {
            return Err(ZSindyError::InvalidSweep {
                reason: format!("x and y axes are both {x_variable}"),
            });
        }
        for key in [x_variable, y_variable] {
            if inputs.grid(key).is_none() {
                return Err(ZSindyError::InvalidSweep { reason: format!("no grid for {key}") });
            }
        }
        Ok(PhaseDiagram {
            trajectory,
            inputs,
            max_num_terms,
            poly_degree,
            variable_names,
            x_variable,
            y_variable,
            accuracy: None,
            true_features: None,
            seed: 0,
        })
    }

    /// Simulate every fit over the first `horizon` samples and record accuracy
    /// and divergence against the clean trajectory.
    pub fn with_accuracy(mut self, horizon: usize, threshold: f64) -> Self {
        self.accuracy = Some(AccuracySettings { horizon: horizon.max(1), threshold });
        self
    }

    /// Per-dimension labels of the true model (e.g. `"x, x*y"`), required by
    /// [`PhaseDiagram::build_diag_rank_prob`].
    pub fn with_true_features<S: Into<String>>(mut self, labels: Vec<S>) -> Self {
        self.true_features = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn inputs(&self) -> &SweepInputs {
        &self.inputs
    }

    pub fn index_combinations(&self) -> (Vec<Vec<usize>>, Vec<SweepKey>) {
        self.inputs.index_combinations()
    }

    /// Fit one model per grid point.
    ///
    /// ## Steps (per point)
    /// 1. Keep the first `floor(dataratio · T − 1)` samples.
    /// 2. Add `eta · N(0, 1)` noise to the states.
    /// 3. Fit [`ZSindy`] with `rho` (or `eta` when no rho grid is given).
    /// 4. Optionally simulate from the clean `x[0]` and score the result.
    ///
    /// ## Errors
    /// - [`ZSindyError::InvalidSweep`] when a data ratio leaves no samples.
    /// - Any fit or simulation error of a grid point.
    pub fn sweep_params(&self) -> ZSindyResult<SweepResults> {
        let (combos, keys) = self.index_combinations();
        let start = Instant::now();
        info!(
            target: "rust_zsindy::experiments",
            points = combos.len(),
            x_axis = %self.x_variable,
            y_axis = %self.y_variable,
            "parameter sweep started"
        );

        let points = combos
            .par_iter()
            .enumerate()
            .map(|(flat, index)| self.run_point(flat, index, &keys))
            .collect::<ZSindyResult<Vec<_>>>()?;

        info!(
            target: "rust_zsindy::experiments",
            points = points.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "parameter sweep finished"
        );
        Ok(SweepResults { keys, points })
    }

    /// Number of non-zero coefficients per cell.
    pub fn build_diag_setsize(
        &self, results: &SweepResults,
    ) -> ZSindyResult<(Array2<f64>, AxisTicks)> {
        let (xi, yi) = self.axis_positions(results)?;
        let mut set_size = self.empty_grid();
        for point in &results.points {
            let count = point.coefficients.iter().filter(|&&c| c != 0.0).count();
            set_size[[point.index[yi], point.index[xi]]] = count as f64;
        }
        Ok((flip_rows(set_size), self.ticks()))
    }

    /// Per dimension, the probability of the true label and its rank among
    /// the candidates sorted by normalized free energy.
    ///
    /// A true label that was not ranked (e.g. excluded as singular) records
    /// probability `0` and rank `NaN`.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidSweep`] without true features, or when their
    ///   count differs from the state dimension.
    pub fn build_diag_rank_prob(
        &self, results: &SweepResults,
    ) -> ZSindyResult<(Vec<Array2<f64>>, Vec<Array2<f64>>, AxisTicks)> {
        let truth = self.true_features.as_ref().ok_or_else(|| ZSindyError::InvalidSweep {
            reason: "true features are required for rank/probability diagrams".to_string(),
        })?;
        let n_dims = self.trajectory.n_variables();
        if truth.len() != n_dims {
            return Err(ZSindyError::InvalidSweep {
                reason: format!("expected {n_dims} true feature labels, got {}", truth.len()),
            });
        }
        let (xi, yi) = self.axis_positions(results)?;

        let mut probs = Vec::with_capacity(n_dims);
        let mut ranks = Vec::with_capacity(n_dims);
        for (dim, label) in truth.iter().enumerate() {
            let mut prob = self.empty_grid();
            let mut rank = self.empty_grid();
            for point in &results.points {
                let cell = [point.index[yi], point.index[xi]];
                let (p, r) = true_probability_and_rank(point, dim, label);
                prob[cell] = p;
                rank[cell] = r;
            }
            probs.push(flip_rows(prob));
            ranks.push(flip_rows(rank));
        }
        Ok((probs, ranks, self.ticks()))
    }

    /// Accuracy and mean divergence index per cell.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidSweep`] when the sweep ran without accuracy.
    pub fn build_diag_accuracy(
        &self, results: &SweepResults,
    ) -> ZSindyResult<(Array2<f64>, Array2<f64>, AxisTicks)> {
        let (xi, yi) = self.axis_positions(results)?;
        let mut accuracy = self.empty_grid();
        let mut divergence = self.empty_grid();
        for point in &results.points {
            let (Some(acc), Some(div)) = (point.accuracy, point.divergence.as_ref()) else {
                return Err(ZSindyError::InvalidSweep {
                    reason: "sweep was run without accuracy".to_string(),
                });
            };
            let cell = [point.index[yi], point.index[xi]];
            accuracy[cell] = acc;
            divergence[cell] = if div.is_empty() {
                0.0
            } else {
                div.iter().sum::<usize>() as f64 / div.len() as f64
            };
        }
        Ok((flip_rows(accuracy), flip_rows(divergence), self.ticks()))
    }

    // ---- Helper methods ----

    fn run_point(
        &self, flat: usize, index: &[usize], keys: &[SweepKey],
    ) -> ZSindyResult<SweepPoint> {
        let value = |key: SweepKey| -> f64 {
            keys.iter()
                .position(|&k| k == key)
                .and_then(|pos| self.inputs.grid(key).and_then(|g| g.get(index[pos])))
                .copied()
                .unwrap_or(f64::NAN)
        };
        let eta = value(SweepKey::Eta);
        let lmbda = value(SweepKey::Lmbda);
        let dataratio = value(SweepKey::DataRatio);
        let rho = if self.inputs.rho.is_some() { value(SweepKey::Rho) } else { eta };

        let n_total = self.trajectory.n_samples() as f64;
        let idx_end = (dataratio * n_total - 1.0).floor().max(0.0) as usize;
        let window = self.trajectory.truncated(idx_end).ok_or_else(|| ZSindyError::InvalidSweep {
            reason: format!("data ratio {dataratio} leaves no samples"),
        })?;

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(flat as u64));
        let noise =
            Array2::from_shape_fn(window.x.raw_dim(), |_| rng.sample::<f64, _>(StandardNormal));
        let noisy = &window.x + &(noise * eta);

        let options = ZSindyOptions::new(rho, lmbda, self.max_num_terms, self.poly_degree)?
            .with_variable_names(self.variable_names.clone());
        let mut model = ZSindy::new(options);
        let coefficients = model.fit(noisy, window.t.clone())?;

        let (accuracy, divergence) = match self.accuracy {
            Some(settings) => {
                let (acc, div) = self.score_simulation(&model, &window, settings)?;
                (Some(acc), Some(div))
            }
            None => (None, None),
        };

        debug!(
            target: "rust_zsindy::experiments",
            point = flat,
            eta,
            lmbda,
            dataratio,
            rho,
            samples = idx_end,
            active_terms = coefficients.iter().filter(|&&c| c != 0.0).count(),
            "grid point fitted"
        );

        Ok(SweepPoint {
            index: index.to_vec(),
            eta,
            lmbda,
            dataratio,
            rho,
            n_samples: idx_end,
            probabilities: model.get_probabilities()?,
            free_energies: model.get_free_energies()?,
            feature_combinations: model.get_feature_combinations()?,
            coefficients,
            accuracy,
            divergence,
        })
    }

    fn score_simulation(
        &self, model: &ZSindy, window: &Trajectory, settings: AccuracySettings,
    ) -> ZSindyResult<(f64, Vec<usize>)> {
        let horizon = settings.horizon.min(window.n_samples());
        let reference = self.trajectory.x.slice(s![..horizon, ..]);
        let predicted =
            model.simulate(self.trajectory.x.row(0), window.t.slice(s![..horizon]), None)?;

        let diff = (&predicted - &reference).mapv(nan_to_num);
        let accuracy = spectral_norm(&diff);
        let divergence = predicted
            .axis_iter(Axis(1))
            .zip(reference.axis_iter(Axis(1)))
            .map(|(p, r)| find_divergence_index(p, r, settings.threshold))
            .collect();
        Ok((accuracy, divergence))
    }

    fn axis_positions(&self, results: &SweepResults) -> ZSindyResult<(usize, usize)> {
        let find = |key: SweepKey| {
            results.keys.iter().position(|&k| k == key).ok_or_else(|| ZSindyError::InvalidSweep {
                reason: format!("results carry no {key} axis"),
            })
        };
        Ok((find(self.x_variable)?, find(self.y_variable)?))
    }

    fn empty_grid(&self) -> Array2<f64> {
        Array2::zeros((self.grid_len(self.y_variable), self.grid_len(self.x_variable)))
    }

    fn grid_len(&self, key: SweepKey) -> usize {
        self.inputs.grid(key).map_or(0, <[f64]>::len)
    }

    fn ticks(&self) -> AxisTicks {
        let fmt = |values: &[f64]| values.iter().map(|v| format!("{v:.1e}")).collect::<Vec<_>>();
        let x = self.inputs.grid(self.x_variable).map(fmt).unwrap_or_default();
        let mut y = self.inputs.grid(self.y_variable).map(fmt).unwrap_or_default();
        y.reverse();
        AxisTicks { x, y }
    }
}

/// First index where `|a[i] − b[i]| > threshold` (NaN counts as diverged),
/// or the common length when the trajectories never separate.
pub fn find_divergence_index(
    a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, threshold: f64,
) -> usize {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| !((x - y).abs() <= threshold))
        .unwrap_or_else(|| a.len().min(b.len()))
}

fn true_probability_and_rank(point: &SweepPoint, dim: usize, label: &str) -> (f64, f64) {
    let (Some(labels), Some(probs), Some(energies)) = (
        point.feature_combinations.get(dim),
        point.probabilities.get(dim),
        point.free_energies.get(dim),
    ) else {
        return (0.0, f64::NAN);
    };
    let Some(j) = labels.iter().position(|l| l == label) else {
        return (0.0, f64::NAN);
    };
    let mut order: Vec<usize> = (0..energies.len()).collect();
    order.sort_by(|&a, &b| energies[a].total_cmp(&energies[b]));
    let rank = order.iter().position(|&k| k == j).map_or(f64::NAN, |r| r as f64);
    (probs.get(j).copied().unwrap_or(0.0), rank)
}

fn nan_to_num(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else if v.is_infinite() {
        f64::MAX.copysign(v)
    } else {
        v
    }
}

fn spectral_norm(m: &Array2<f64>) -> f64 {
    if m.is_empty() {
        return 0.0;
    }
    let dm = DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]]);
    dm.singular_values().iter().copied().fold(0.0, f64::max)
}

fn flip_rows(m: Array2<f64>) -> Array2<f64> {
    m.slice(s![..;-1, ..]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::polynomial::PolynomialSystem;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sweep bookkeeping (one point per grid combination, index order).
    // - Diagram orientation (rows flipped, y ticks reversed).
    // - Seeded reproducibility of the noise.
    // - Preconditions of the rank/probability and accuracy diagrams.
    // - `find_divergence_index` edge cases.
    // -------------------------------------------------------------------------

    fn decay_growth() -> (Array2<f64>, Array1<f64>) {
        let sys = PolynomialSystem::decay_growth(0.5, 2.0).unwrap();
        let (t, x) = sys.solve(array![1.0, 1.0].view(), 0.01, 1.0).unwrap();
        (x, t)
    }

    fn diagram(inputs: SweepInputs) -> PhaseDiagram {
        let (x, t) = decay_growth();
        PhaseDiagram::new(
            x,
            t,
            inputs,
            2,
            2,
            vec!["x".to_string(), "y".to_string()],
            SweepKey::Lmbda,
            SweepKey::Eta,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A sweep produces one point per grid combination and a set-size diagram
    // oriented with the largest y value on top.
    //
    // Given
    // -----
    // - eta (y) = [1e-3, 1e-2], lmbda (x) = [0, 1, 10], dataratio = [1].
    //
    // Expect
    // ------
    // - 6 points in index order; a 2×3 set-size matrix with 2..=4 terms per
    //   cell; y ticks ["1.0e-2", "1.0e-3"]; row 0 holds eta = 1e-2.
    fn sweep_and_setsize_diagram_are_aligned() {
        let inputs =
            SweepInputs::new(vec![1e-3, 1e-2], vec![0.0, 1.0, 10.0], vec![1.0], None).unwrap();
        let diag = diagram(inputs).with_seed(7);

        let results = diag.sweep_params().unwrap();
        let (set_size, ticks) = diag.build_diag_setsize(&results).unwrap();

        assert_eq!(results.points.len(), 6);
        assert_eq!(results.points[1].index, vec![0, 0, 1]);
        assert_eq!(results.points[0].n_samples, 100);
        assert_eq!(set_size.dim(), (2, 3));
        assert!(set_size.iter().all(|&v| (2.0..=4.0).contains(&v)));
        assert_eq!(ticks.x, vec!["0.0e0", "1.0e0", "1.0e1"]);
        assert_eq!(ticks.y, vec!["1.0e-2", "1.0e-3"]);
        let top_left = results
            .points
            .iter()
            .find(|p| p.eta == 1e-2 && p.lmbda == 0.0)
            .unwrap();
        let expected = top_left.coefficients.iter().filter(|&&c| c != 0.0).count() as f64;
        assert_eq!(set_size[[0, 0]], expected);
    }

    #[test]
    fn sweep_is_reproducible_for_a_fixed_seed() {
        let inputs = SweepInputs::new(vec![1e-2], vec![1.0], vec![0.5, 1.0], None).unwrap();
        let diag = diagram(inputs).with_seed(42);

        let first = diag.sweep_params().unwrap();
        let second = diag.sweep_params().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.points[0].n_samples, 49);
    }

    #[test]
    // Purpose
    // -------
    // Rank/probability diagrams locate the true label per dimension.
    //
    // Given
    // -----
    // - Near-clean data (eta = 0, rho = 1e-2) and true labels `x` / `x*y`.
    //
    // Expect
    // ------
    // - One matrix per dimension; probabilities in [0, 1]; ranks are
    //   non-negative whole numbers.
    // - Without true labels the builder returns `InvalidSweep`.
    fn rank_prob_diagram_requires_and_uses_true_labels() {
        let inputs =
            SweepInputs::new(vec![0.0], vec![0.0, 1.0], vec![1.0], Some(vec![1e-2])).unwrap();
        let bare = diagram(inputs.clone());
        let results = bare.sweep_params().unwrap();

        assert!(matches!(
            bare.build_diag_rank_prob(&results),
            Err(ZSindyError::InvalidSweep { .. })
        ));

        let diag = diagram(inputs).with_true_features(vec!["x", "x*y"]);
        let (probs, ranks, ticks) = diag.build_diag_rank_prob(&results).unwrap();

        assert_eq!(probs.len(), 2);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ticks.y, vec!["0.0e0"]);
        for (p, r) in probs.iter().zip(ranks.iter()) {
            assert_eq!(p.dim(), (1, 2));
            assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));
            assert!(r.iter().all(|&v| v >= 0.0 && v.fract() == 0.0));
        }
    }

    #[test]
    fn accuracy_diagram_needs_accuracy_results() {
        let inputs = SweepInputs::new(vec![0.0], vec![1.0], vec![1.0], Some(vec![1e-2])).unwrap();
        let plain = diagram(inputs.clone());
        let results = plain.sweep_params().unwrap();

        assert!(matches!(
            plain.build_diag_accuracy(&results),
            Err(ZSindyError::InvalidSweep { .. })
        ));

        let diag = diagram(inputs).with_accuracy(50, DEFAULT_DIVERGENCE_THRESHOLD);
        let results = diag.sweep_params().unwrap();
        let (acc, div, _) = diag.build_diag_accuracy(&results).unwrap();

        assert!(acc[[0, 0]].is_finite() && acc[[0, 0]] >= 0.0);
        assert!((0.0..=50.0).contains(&div[[0, 0]]));
        assert_eq!(results.points[0].divergence.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn new_rejects_bad_axes() {
        let (x, t) = decay_growth();
        let inputs = SweepInputs::new(vec![0.1], vec![1.0], vec![1.0], None).unwrap();
        let names = vec!["x".to_string(), "y".to_string()];

        let same = PhaseDiagram::new(
            x.clone(),
            t.clone(),
            inputs.clone(),
            2,
            2,
            names.clone(),
            SweepKey::Eta,
            SweepKey::Eta,
        );
        let missing = PhaseDiagram::new(x, t, inputs, 2, 2, names, SweepKey::Rho, SweepKey::Eta);

        assert!(matches!(same, Err(ZSindyError::InvalidSweep { .. })));
        assert!(matches!(missing, Err(ZSindyError::InvalidSweep { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Pin the divergence-index contract.
    //
    // Given
    // -----
    // - Identical series, a series that separates at index 2, and a NaN.
    //
    // Expect
    // ------
    // - Full length, 2, and the NaN position respectively.
    fn find_divergence_index_edges() {
        let a = array![0.0, 0.0, 0.0, 0.0];
        let b = array![0.0, 0.005, 0.5, 0.0];
        let c = array![0.0, f64::NAN, 0.0, 0.0];

        assert_eq!(find_divergence_index(a.view(), a.view(), 0.01), 4);
        assert_eq!(find_divergence_index(a.view(), b.view(), 0.01), 2);
        assert_eq!(find_divergence_index(a.view(), c.view(), 0.01), 1);
    }

    #[test]
    fn nan_to_num_and_flip_rows() {
        assert_eq!(nan_to_num(f64::NAN), 0.0);
        assert_eq!(nan_to_num(f64::NEG_INFINITY), -f64::MAX);
        assert_eq!(flip_rows(array![[1.0, 2.0], [3.0, 4.0]]), array![[3.0, 4.0], [1.0, 2.0]]);
        assert!((spectral_norm(&array![[3.0, 0.0], [0.0, -4.0]]) - 4.0).abs() < 1e-12);
    }
}
