//! Candidate feature libraries (basis functions over state variables).
//!
//! Purpose
//! -------
//! Build the ordered, named candidate basis that the evidence search selects
//! from, and evaluate it on state samples to produce the design matrix
//! `Θ` (`T × n_f`). The feature index ↔ name mapping is canonical for a given
//! configuration so that coefficients, labels, and printed equations never
//! drift between calls.
//!
//! Key behaviors
//! -------------
//! - [`FeatureLibrary`] is the capability interface: `names()` plus
//!   `transform(x)`. Any basis family implementing it can be plugged into
//!   [`crate::discovery::models::zsindy::ZSindy`].
//! - [`PolynomialLibrary`] enumerates monomials of degree `0..=p` in
//!   deg-lexicographic order (bias first).
//! - [`FourierLibrary`] enumerates `sin(k·v)`, `cos(k·v)` for each
//!   frequency `k` and variable `v`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `transform` rejects inputs whose column count differs from the configured
//!   variable count with [`ZSindyError::DimensionMismatch`].
//! - Output rows are aligned one-to-one with input rows.
//!
//! Conventions
//! -----------
//! - Monomials are stored as non-decreasing lists of variable indices
//!   (`[0, 0, 1]` is `x^2*y`).
//! - Names use `*` between factors and `^k` for repeated factors; the bias is
//!   named `"1"`.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the canonical ordering for two variables, feature counts
//!   for three variables, evaluation of mixed monomials, and dimension
//!   mismatch errors.
use crate::discovery::errors::{ZSindyError, ZSindyResult};
use ndarray::{Array2, ArrayView2};

/// Capability interface for a candidate basis.
///
/// Implementors must keep `names()` and the columns of `transform` in the same
/// order, and that order must not depend on the data.
pub trait FeatureLibrary: Send + Sync {
    /// Ordered feature names (`n_f` entries).
    fn names(&self) -> Vec<String>;

    /// Number of candidate features `n_f`.
    fn n_features(&self) -> usize;

    /// Number of state variables expected by `transform`.
    fn n_variables(&self) -> usize;

    /// Evaluate every feature at every row of `x` (`T × d` → `T × n_f`).
    ///
    /// # Errors
    /// - [`ZSindyError::DimensionMismatch`] when `x.ncols() != n_variables()`.
    fn transform(&self, x: ArrayView2<'_, f64>) -> ZSindyResult<Array2<f64>>;
}

/// Polynomial basis of total degree at most `degree`.
///
/// For variables `(x, y)` and `degree = 2` the canonical order is
/// `1, x, y, x^2, x*y, y^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialLibrary {
    variable_names: Vec<String>,
    degree: usize,
    include_bias: bool,
    monomials: Vec<Vec<usize>>,
}

impl PolynomialLibrary {
    /// Build the monomial list for `variable_names.len()` variables.
    ///
    /// # Arguments
    /// - `variable_names`: display labels; their count fixes `d`.
    /// - `degree`: maximal total degree `p` (0 leaves only the bias, if any).
    /// - `include_bias`: whether the constant feature `"1"` is included.
    pub fn new(variable_names: Vec<String>, degree: usize, include_bias: bool) -> Self {
        let n_vars = variable_names.len();
        let mut monomials = Vec::new();
        if include_bias {
            monomials.push(Vec::new());
        }
        if n_vars > 0 {
            for deg in 1..=degree {
                push_multisets(n_vars, deg, &mut monomials);
            }
        }
        PolynomialLibrary { variable_names, degree, include_bias, monomials }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn include_bias(&self) -> bool {
        self.include_bias
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    /// Index of the feature named `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| n == name)
    }

    fn monomial_name(&self, monomial: &[usize]) -> String {
        if monomial.is_empty() {
            return "1".to_string();
        }
        let mut factors: Vec<String> = Vec::new();
        let mut i = 0;
        while i < monomial.len() {
            let var = monomial[i];
            let mut power = 1;
            while i + power < monomial.len() && monomial[i + power] == var {
                power += 1;
            }
            let label = &self.variable_names[var];
            factors.push(if power == 1 { label.clone() } else { format!("{label}^{power}") });
            i += power;
        }
        factors.join("*")
    }
}

impl FeatureLibrary for PolynomialLibrary {
    fn names(&self) -> Vec<String> {
        self.monomials.iter().map(|m| self.monomial_name(m)).collect()
    }

    fn n_features(&self) -> usize {
        self.monomials.len()
    }

    fn n_variables(&self) -> usize {
        self.variable_names.len()
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> ZSindyResult<Array2<f64>> {
        check_columns(x, self.n_variables())?;
        let mut theta = Array2::<f64>::zeros((x.nrows(), self.monomials.len()));
        for (row, mut out) in x.rows().into_iter().zip(theta.rows_mut()) {
            for (col, monomial) in self.monomials.iter().enumerate() {
                out[col] = monomial.iter().fold(1.0, |acc, &var| acc * row[var]);
            }
        }
        Ok(theta)
    }
}

/// Trigonometric basis `sin(k·v), cos(k·v)` for `k = 1..=n_frequencies`.
///
/// Order: frequency-major, then variable, then `sin` before `cos`.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierLibrary {
    variable_names: Vec<String>,
    n_frequencies: usize,
}

impl FourierLibrary {
    /// # Errors
    /// - [`ZSindyError::InvalidFrequencies`] when `n_frequencies == 0`.
    pub fn new(variable_names: Vec<String>, n_frequencies: usize) -> ZSindyResult<Self> {
        if n_frequencies == 0 {
            return Err(ZSindyError::InvalidFrequencies { value: n_frequencies });
        }
        Ok(FourierLibrary { variable_names, n_frequencies })
    }
}

impl FeatureLibrary for FourierLibrary {
    fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features());
        for k in 1..=self.n_frequencies {
            for v in &self.variable_names {
                if k == 1 {
                    names.push(format!("sin({v})"));
                    names.push(format!("cos({v})"));
                } else {
                    names.push(format!("sin({k}{v})"));
                    names.push(format!("cos({k}{v})"));
                }
            }
        }
        names
    }

    fn n_features(&self) -> usize {
        2 * self.n_frequencies * self.variable_names.len()
    }

    fn n_variables(&self) -> usize {
        self.variable_names.len()
    }

    fn transform(&self, x: ArrayView2<'_, f64>) -> ZSindyResult<Array2<f64>> {
        check_columns(x, self.n_variables())?;
        let mut theta = Array2::<f64>::zeros((x.nrows(), self.n_features()));
        for (row, mut out) in x.rows().into_iter().zip(theta.rows_mut()) {
            let mut col = 0;
            for k in 1..=self.n_frequencies {
                for &value in row.iter() {
                    let arg = k as f64 * value;
                    out[col] = arg.sin();
                    out[col + 1] = arg.cos();
                    col += 2;
                }
            }
        }
        Ok(theta)
    }
}

// ---- Helper methods ----

fn check_columns(x: ArrayView2<'_, f64>, expected: usize) -> ZSindyResult<()> {
    if x.ncols() != expected {
        return Err(ZSindyError::DimensionMismatch { expected, actual: x.ncols() });
    }
    Ok(())
}

/// Append every non-decreasing index list of length `len` over `0..n`, in
/// lexicographic order.
fn push_multisets(n: usize, len: usize, out: &mut Vec<Vec<usize>>) {
    let mut current = vec![0usize; len];
    loop {
        out.push(current.clone());
        // Rightmost position that can still be incremented.
        let mut pos = len;
        while pos > 0 && current[pos - 1] == n - 1 {
            pos -= 1;
        }
        if pos == 0 {
            return;
        }
        let next = current[pos - 1] + 1;
        for slot in current[pos - 1..].iter_mut() {
            *slot = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn xy() -> Vec<String> {
        vec!["x".to_string(), "y".to_string()]
    }

    #[test]
    // Purpose
    // -------
    // Pin the canonical deg-lexicographic order for two variables.
    //
    // Given
    // -----
    // - Variables (x, y), degree 2, bias included.
    //
    // Expect
    // ------
    // - Names `1, x, y, x^2, x*y, y^2`.
    fn polynomial_names_follow_canonical_order() {
        let lib = PolynomialLibrary::new(xy(), 2, true);

        assert_eq!(lib.names(), vec!["1", "x", "y", "x^2", "x*y", "y^2"]);
        assert_eq!(lib.n_features(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Check the feature count `C(d + p, p)` and mixed-power naming.
    //
    // Given
    // -----
    // - Variables (x, y, z), degree 3, bias included.
    //
    // Expect
    // ------
    // - `C(6, 3) = 20` features, containing `x^2*y` and `x*y*z`.
    fn polynomial_count_matches_binomial_for_three_variables() {
        let names = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let lib = PolynomialLibrary::new(names, 3, true);

        let feats = lib.names();
        assert_eq!(feats.len(), 20);
        assert!(feats.contains(&"x^2*y".to_string()));
        assert!(feats.contains(&"x*y*z".to_string()));
        assert_eq!(feats.last().unwrap(), "z^3");
    }

    #[test]
    fn polynomial_without_bias_starts_at_degree_one() {
        let lib = PolynomialLibrary::new(xy(), 1, false);
        assert_eq!(lib.names(), vec!["x", "y"]);
    }

    #[test]
    // Purpose
    // -------
    // Verify evaluation of each monomial column.
    //
    // Given
    // -----
    // - A single row (2, 3).
    //
    // Expect
    // ------
    // - Row `[1, 2, 3, 4, 6, 9]`.
    fn polynomial_transform_evaluates_monomials() {
        let lib = PolynomialLibrary::new(xy(), 2, true);

        let theta = lib.transform(array![[2.0, 3.0]].view()).unwrap();

        assert_eq!(theta, array![[1.0, 2.0, 3.0, 4.0, 6.0, 9.0]]);
    }

    #[test]
    fn transform_rejects_wrong_column_count() {
        let lib = PolynomialLibrary::new(xy(), 2, true);

        let err = lib.transform(array![[1.0, 2.0, 3.0]].view()).unwrap_err();

        assert_eq!(err, ZSindyError::DimensionMismatch { expected: 2, actual: 3 });
    }

    #[test]
    fn fourier_library_orders_sin_before_cos() {
        let lib = FourierLibrary::new(vec!["x".to_string()], 2).unwrap();

        assert_eq!(lib.names(), vec!["sin(x)", "cos(x)", "sin(2x)", "cos(2x)"]);
        let theta = lib.transform(array![[0.0]].view()).unwrap();
        assert_eq!(theta, array![[0.0, 1.0, 0.0, 1.0]]);
        assert!(FourierLibrary::new(vec!["x".to_string()], 0).is_err());
    }
}
