//! Feature-subset enumeration.
//!
//! Purpose
//! -------
//! Produce every candidate feature subset (`Gamma`) of a given size exactly
//! once, in a fixed lexicographic order, so that scoring and ranking are
//! reproducible across runs and thread counts.
//!
//! Key behaviors
//! -------------
//! - [`Combinations`] is a lazy iterator over all `C(n, k)` ascending index
//!   tuples drawn from `0..n`.
//! - [`Combinations::count`] reports `C(n, k)` via `statrs` without
//!   enumerating.
//! - [`enumerate_up_to`] materializes the size groups `1..=max_k`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every yielded [`Gamma`] is strictly ascending, so permutation-equivalent
//!   subsets can never both appear.
//! - `k == 0` or `k > n` yields nothing.
//!
//! Testing notes
//! -------------
//! - Unit tests check the lexicographic order for small cases, the total of
//!   41 candidates for `n = 6, max_k = 3`, and agreement with `count`.
use statrs::function::factorial::binomial;
use std::fmt;

/// Ascending, duplicate-free set of feature indices.
///
/// Hashable and ordered (lexicographic on the index list), which gives the
/// tie-break order used by the selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gamma(Vec<usize>);

impl Gamma {
    /// Build a subset from arbitrary indices: sorts and removes duplicates.
    ///
    /// Returns `None` when `indices` is empty.
    pub fn new(mut indices: Vec<usize>) -> Option<Self> {
        indices.sort_unstable();
        indices.dedup();
        if indices.is_empty() { None } else { Some(Gamma(indices)) }
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Subset size `k`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join the names of the selected features with `", "`.
    pub fn label(&self, feature_names: &[String]) -> String {
        self.0
            .iter()
            .map(|&i| feature_names.get(i).map(String::as_str).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Lexicographic iterator over the `k`-subsets of `0..n`.
///
/// For `n = 4, k = 2` the order is
/// `[0,1] [0,2] [0,3] [1,2] [1,3] [2,3]`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let current = if k == 0 || k > n { None } else { Some((0..k).collect()) };
        Combinations { n, k, current }
    }

    /// Binomial coefficient `C(n, k)`; zero when `k == 0` or `k > n`.
    pub fn count(n: usize, k: usize) -> usize {
        if k == 0 || k > n {
            return 0;
        }
        binomial(n as u64, k as u64).round() as usize
    }
}

impl Iterator for Combinations {
    type Item = Gamma;

    fn next(&mut self) -> Option<Gamma> {
        let current = self.current.take()?;
        let out = Gamma(current.clone());

        // Rightmost slot that has not reached its maximal value `n - k + i`.
        let mut next = current;
        let mut i = self.k;
        while i > 0 && next[i - 1] == self.n - self.k + (i - 1) {
            i -= 1;
        }
        if i > 0 {
            next[i - 1] += 1;
            for j in i..self.k {
                next[j] = next[j - 1] + 1;
            }
            self.current = Some(next);
        }
        Some(out)
    }
}

/// All subsets of sizes `1..=max_k`, grouped by size (index `s` holds size
/// `s + 1`). Sizes larger than `n` produce empty groups.
pub fn enumerate_up_to(n: usize, max_k: usize) -> Vec<Vec<Gamma>> {
    (1..=max_k)
        .map(|k| {
            let mut group = Vec::with_capacity(Combinations::count(n, k));
            group.extend(Combinations::new(n, k));
            group
        })
        .collect()
}
