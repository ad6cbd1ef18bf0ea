//! experiments::inputs — parameter grids for phase-diagram sweeps.
//!
//! A sweep varies the observation noise `eta`, the sparsity penalty `lmbda`,
//! the fraction of the trajectory used (`dataratio`), and optionally the
//! likelihood noise scale `rho` (which otherwise follows `eta`). Grid keys
//! are ordered alphabetically, and index tuples follow that order.
use crate::discovery::errors::{ZSindyError, ZSindyResult};
use std::{fmt, str::FromStr};

/// Name of one swept parameter. The derived order is alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SweepKey {
    DataRatio,
    Eta,
    Lmbda,
    Rho,
}

impl SweepKey {
    pub fn name(&self) -> &'static str {
        match self {
            SweepKey::DataRatio => "dataratio",
            SweepKey::Eta => "eta",
            SweepKey::Lmbda => "lmbda",
            SweepKey::Rho => "rho",
        }
    }
}

impl fmt::Display for SweepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepKey {
    type Err = ZSindyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dataratio" => Ok(SweepKey::DataRatio),
            "eta" => Ok(SweepKey::Eta),
            "lmbda" | "lambda" => Ok(SweepKey::Lmbda),
            "rho" => Ok(SweepKey::Rho),
            _ => Err(ZSindyError::InvalidSweep { reason: format!("unknown sweep key {s:?}") }),
        }
    }
}

/// Grids of swept values.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepInputs {
    pub eta: Vec<f64>,
    pub lmbda: Vec<f64>,
    pub dataratio: Vec<f64>,
    /// When `None`, `rho = eta` at every grid point.
    pub rho: Option<Vec<f64>>,
}

impl SweepInputs {
    /// Validate and bundle the grids.
    ///
    /// # Errors
    /// - [`ZSindyError::InvalidSweep`] when a grid is empty, `eta < 0`,
    ///   `lmbda < 0`, `dataratio ∉ (0, 1]`, `rho <= 0`, any value is
    ///   non-finite, or `rho` is absent while some `eta == 0`.
    pub fn new(
        eta: Vec<f64>, lmbda: Vec<f64>, dataratio: Vec<f64>, rho: Option<Vec<f64>>,
    ) -> ZSindyResult<Self> {
        check_grid("eta", &eta, |v| v >= 0.0)?;
        check_grid("lmbda", &lmbda, |v| v >= 0.0)?;
        check_grid("dataratio", &dataratio, |v| v > 0.0 && v <= 1.0)?;
        match &rho {
            Some(r) => check_grid("rho", r, |v| v > 0.0)?,
            None => check_grid("eta (used as rho)", &eta, |v| v > 0.0)?,
        }
        Ok(SweepInputs { eta, lmbda, dataratio, rho })
    }

    /// Present keys in alphabetical order.
    pub fn keys(&self) -> Vec<SweepKey> {
        let mut keys = vec![SweepKey::DataRatio, SweepKey::Eta, SweepKey::Lmbda];
        if self.rho.is_some() {
            keys.push(SweepKey::Rho);
        }
        keys
    }

    pub fn grid(&self, key: SweepKey) -> Option<&[f64]> {
        match key {
            SweepKey::DataRatio => Some(&self.dataratio),
            SweepKey::Eta => Some(&self.eta),
            SweepKey::Lmbda => Some(&self.lmbda),
            SweepKey::Rho => self.rho.as_deref(),
        }
    }

    /// Cartesian product of grid indices over [`SweepInputs::keys`], with the
    /// last key varying fastest.
    pub fn index_combinations(&self) -> (Vec<Vec<usize>>, Vec<SweepKey>) {
        let keys = self.keys();
        let lens: Vec<usize> =
            keys.iter().map(|&k| self.grid(k).map_or(0, <[f64]>::len)).collect();
        let mut combos = Vec::with_capacity(lens.iter().product());
        if lens.iter().any(|&l| l == 0) {
            return (combos, keys);
        }
        let mut current = vec![0usize; keys.len()];
        loop {
            combos.push(current.clone());
            let mut pos = keys.len();
            loop {
                if pos == 0 {
                    return (combos, keys);
                }
                pos -= 1;
                current[pos] += 1;
                if current[pos] < lens[pos] {
                    break;
                }
                current[pos] = 0;
            }
        }
    }
}

fn check_grid(name: &str, grid: &[f64], valid: impl Fn(f64) -> bool) -> ZSindyResult<()> {
    if grid.is_empty() {
        return Err(ZSindyError::InvalidSweep { reason: format!("{name} grid is empty") });
    }
    if let Some(bad) = grid.iter().find(|&&v| !v.is_finite() || !valid(v)) {
        return Err(ZSindyError::InvalidSweep {
            reason: format!("{name} value {bad} is out of range"),
        });
    }
    Ok(())
}
