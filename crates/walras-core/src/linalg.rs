//! Dense linear-algebra helpers on top of `nalgebra`.
//!
//! The solver works with explicit inverses of the preference matrix and of
//! its Gram matrix. Both are obtained from an LU decomposition with partial
//! pivoting; a zero pivot or a non-finite result is reported as
//! [`EquilibriumError::SingularMatrix`].

use nalgebra::{DMatrix, DVector};

use crate::error::EquilibriumError;

/// Build a square matrix from row-major rows.
///
/// # Errors
///
/// Returns [`EquilibriumError::EmptyEconomy`] for zero rows,
/// [`EquilibriumError::DimensionMismatch`] if any row length differs from
/// the row count, and [`EquilibriumError::NonFiniteInput`] for NaN or
/// infinite entries.
pub fn square_from_rows(
    rows: &[Vec<f64>],
    what: &'static str,
) -> Result<DMatrix<f64>, EquilibriumError> {
    let n = rows.len();
    if n == 0 {
        return Err(EquilibriumError::EmptyEconomy);
    }
    if let Some(bad) = rows.iter().find(|row| row.len() != n) {
        return Err(EquilibriumError::DimensionMismatch {
            what,
            expected: n,
            actual: bad.len(),
        });
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let matrix = DMatrix::from_row_slice(n, n, &flat);
    ensure_finite(matrix.iter(), what)?;
    Ok(matrix)
}

/// Build a vector of the given length from a slice.
///
/// # Errors
///
/// Returns [`EquilibriumError::DimensionMismatch`] if the length differs
/// and [`EquilibriumError::NonFiniteInput`] for NaN or infinite entries.
pub fn vector_of_len(
    values: &[f64],
    len: usize,
    what: &'static str,
) -> Result<DVector<f64>, EquilibriumError> {
    if values.len() != len {
        return Err(EquilibriumError::DimensionMismatch {
            what,
            expected: len,
            actual: values.len(),
        });
    }
    ensure_finite(values.iter(), what)?;
    Ok(DVector::from_column_slice(values))
}

/// Fail with [`EquilibriumError::NonFiniteInput`] if any value is NaN or infinite.
pub fn ensure_finite<'a>(
    mut values: impl Iterator<Item = &'a f64>,
    what: &'static str,
) -> Result<(), EquilibriumError> {
    if values.all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EquilibriumError::NonFiniteInput { what })
    }
}

/// Invert a square matrix through its LU decomposition.
///
/// # Errors
///
/// Returns [`EquilibriumError::SingularMatrix`] naming `which` when the
/// decomposition hits a zero pivot or the inverse is not finite.
pub fn invert(matrix: &DMatrix<f64>, which: &'static str) -> Result<DMatrix<f64>, EquilibriumError> {
    let inverse = matrix
        .clone()
        .lu()
        .try_inverse()
        .ok_or(EquilibriumError::SingularMatrix { which })?;
    if inverse.iter().all(|v| v.is_finite()) {
        Ok(inverse)
    } else {
        Err(EquilibriumError::SingularMatrix { which })
    }
}

/// Component-wise sum of equally sized vectors.
pub fn sum_vectors<'a>(vectors: impl Iterator<Item = &'a DVector<f64>>, len: usize) -> DVector<f64> {
    vectors.fold(DVector::zeros(len), |acc, v| acc + v)
}

/// The two inverses every equilibrium computation needs.
///
/// `slope` is `(ΠᵗΠ)⁻¹`, the matrix that maps prices into demand
/// adjustments; `preferences_inv` is `Π⁻¹`, which maps bliss points into
/// satiation bundles.
#[derive(Debug, Clone)]
pub struct PreferenceInverses {
    /// `(ΠᵗΠ)⁻¹`.
    pub slope: DMatrix<f64>,
    /// `Π⁻¹`.
    pub preferences_inv: DMatrix<f64>,
}

impl PreferenceInverses {
    /// Compute both inverses for the preference matrix `Π`.
    ///
    /// # Errors
    ///
    /// Returns [`EquilibriumError::SingularMatrix`] if `Π` or `ΠᵗΠ` is singular.
    pub fn compute(preferences: &DMatrix<f64>) -> Result<Self, EquilibriumError> {
        let preferences_inv = invert(preferences, "preference matrix")?;
        let gram = preferences.transpose() * preferences;
        let slope = invert(&gram, "preference Gram matrix")?;
        Ok(Self {
            slope,
            preferences_inv,
        })
    }
}
