//! core::evidence — closed-form Bayesian free energy of feature subsets.
//!
//! Purpose
//! -------
//! Score a candidate subset `γ` for one output dimension by the negative log
//! marginal likelihood of a linear-Gaussian regression `ẋ_dim ≈ Θ[:, γ] β`
//! with noise scale `ρ`. Sufficient statistics are precomputed once per fit
//! in [`Gram`] so that each score only touches `k × k` blocks.
//!
//! Key behaviors
//! -------------
//! - [`Gram::new`] forms `C = ΘᵀΘ` and `V = ΘᵀẊ`.
//! - [`EvidenceScorer::score`] returns a [`CandidateScore`] with
//!   ```text
//!   F = -(k/2)·ln(2πρ²) + ½·ln det C_γγ − (1/(2ρ²))·V_γᵀ C_γγ⁻¹ V_γ
//!   β̂ = C_γγ⁻¹ V_γ
//!   ```
//!   and per-coefficient variances according to [`VarianceMode`].
//! - Singular blocks yield [`ZSindyError::SingularSubset`]; the selector
//!   treats those as `F = +∞`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `Θ` and `Ẋ` are row-aligned; checked in [`Gram::new`].
//! - `γ` is ascending, so scores are independent of the order in which the
//!   caller listed the indices.
//! - The scorer only reads the `Gram`; it is `Sync` and shared by reference
//!   across rayon workers.
//!
//! Testing notes
//! -------------
//! - Unit tests compare a single-feature score to its scalar closed form,
//!   verify invariance to column permutation of `Θ`, detect duplicated
//!   columns as singular, and check that the two variance modes coincide
//!   when `γ` covers the whole library.
use crate::discovery::{
    core::{
        combinations::Gamma,
        linalg::{SpdFactor, fill_dmatrix, gather_block, gather_column},
        options::VarianceMode,
    },
    errors::{ZSindyError, ZSindyResult},
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2};
use std::f64::consts::PI;

/// Sufficient statistics of one fit: `C = ΘᵀΘ` (`n_f × n_f`) and
/// `V = ΘᵀẊ` (`n_f × d`).
#[derive(Debug, Clone, PartialEq)]
pub struct Gram {
    pub c: Array2<f64>,
    pub v: Array2<f64>,
    pub n_samples: usize,
}

impl Gram {
    /// # Errors
    /// - [`ZSindyError::LengthMismatch`] when `theta` and `xdot` have
    ///   different row counts.
    pub fn new(theta: ArrayView2<'_, f64>, xdot: ArrayView2<'_, f64>) -> ZSindyResult<Self> {
        if theta.nrows() != xdot.nrows() {
            return Err(ZSindyError::LengthMismatch { states: xdot.nrows(), times: theta.nrows() });
        }
        let c = theta.t().dot(&theta);
        let v = theta.t().dot(&xdot);
        Ok(Gram { c, v, n_samples: theta.nrows() })
    }

    pub fn n_features(&self) -> usize {
        self.c.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.v.ncols()
    }
}

/// Score of one `(dim, γ)` pair.
///
/// `coefficients` and `variances` are restricted to `γ` (length `k`, same
/// order as `gamma.indices()`).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub dim: usize,
    pub gamma: Gamma,
    pub free_energy: f64,
    pub coefficients: Array1<f64>,
    pub variances: Array1<f64>,
}

/// Evaluates the free energy of subsets against a shared [`Gram`].
#[derive(Debug, Clone)]
pub struct EvidenceScorer<'a> {
    gram: &'a Gram,
    rho: f64,
    variance_mode: VarianceMode,
    full_inverse_diag: Option<Array1<f64>>,
}

impl<'a> EvidenceScorer<'a> {
    /// Build a scorer for noise scale `rho`.
    ///
    /// Under [`VarianceMode::FullLibrary`] the full Gram matrix is factorized
    /// once here.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidRho`] when `rho` is not finite and positive.
    /// - [`ZSindyError::SingularLibrary`] when full-library variances are
    ///   requested and `C` is singular.
    pub fn new(gram: &'a Gram, rho: f64, variance_mode: VarianceMode) -> ZSindyResult<Self> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ZSindyError::InvalidRho { value: rho });
        }
        let full_inverse_diag = match variance_mode {
            VarianceMode::Restricted => None,
            VarianceMode::FullLibrary => {
                let n = gram.n_features();
                let mut c = DMatrix::<f64>::zeros(n, n);
                fill_dmatrix(gram.c.view(), &mut c);
                let factor = SpdFactor::new(c).ok_or(ZSindyError::SingularLibrary)?;
                Some(Array1::from_iter(factor.inverse_diagonal().iter().copied()))
            }
        };
        Ok(EvidenceScorer { gram, rho, variance_mode, full_inverse_diag })
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn variance_mode(&self) -> VarianceMode {
        self.variance_mode
    }

    /// Library width `n_f` of the underlying Gram matrix.
    pub fn n_features(&self) -> usize {
        self.gram.n_features()
    }

    /// Free energy, restricted mean, and variances of `gamma` for output
    /// `dim`.
    ///
    /// # Errors
    /// - [`ZSindyError::SingularSubset`] when `C[γ, γ]` is not numerically
    ///   positive definite or the resulting free energy is not finite.
    pub fn score(&self, dim: usize, gamma: &Gamma) -> ZSindyResult<CandidateScore> {
        let idx = gamma.indices();
        let singular = || ZSindyError::SingularSubset { dim, gamma: idx.to_vec() };

        let factor = SpdFactor::new(gather_block(&self.gram.c, idx)).ok_or_else(singular)?;
        let sub_v = gather_column(&self.gram.v, idx, dim);
        let beta = factor.solve(&sub_v);

        let k = idx.len() as f64;
        let rho2 = self.rho * self.rho;
        let quad = sub_v.dot(&beta);
        let free_energy =
            -0.5 * k * (2.0 * PI * rho2).ln() + 0.5 * factor.logdet() - quad / (2.0 * rho2);
        if !free_energy.is_finite() {
            return Err(singular());
        }

        let variances: Array1<f64> = match &self.full_inverse_diag {
            None => factor.inverse_diagonal().iter().map(|&d| rho2 * d).collect(),
            Some(full) => idx.iter().map(|&i| rho2 * full[i]).collect(),
        };

        Ok(CandidateScore {
            dim,
            gamma: gamma.clone(),
            free_energy,
            coefficients: beta.iter().copied().collect(),
            variances,
        })
    }
}
