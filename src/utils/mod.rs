//! # Utilities
//!
//! Shared helpers for Cholesky factorizations, linear solves, and
//! covariance-derived quantities used by the model implementations.

use faer::Mat;
use faer::prelude::Solve;

#[must_use]
pub fn matrix_is_finite(matrix: &Mat<f64>) -> bool {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            if !matrix[(i, j)].is_finite() {
                return false;
            }
        }
    }
    true
}

#[must_use]
pub fn identity_matrix(dim: usize) -> Mat<f64> {
    Mat::from_fn(dim, dim, |row, col| if row == col { 1.0 } else { 0.0 })
}

#[must_use]
pub fn diagonal_from_matrix(matrix: &Mat<f64>) -> Vec<f64> {
    let n = matrix.nrows().min(matrix.ncols());
    (0..n).map(|idx| matrix[(idx, idx)]).collect()
}

/// Lower Cholesky factor, or `None` when the matrix is not square or not
/// positive definite.
#[must_use]
pub fn cholesky_lower(matrix: &Mat<f64>) -> Option<Mat<f64>> {
    let dim = matrix.ncols();
    if matrix.nrows() != dim {
        return None;
    }
    let mut lower = Mat::<f64>::zeros(dim, dim);
    for row in 0..dim {
        for col in 0..=row {
            let mut sum = matrix[(row, col)];
            for k in 0..col {
                sum -= lower[(row, k)] * lower[(col, k)];
            }
            if row == col {
                if sum <= 0.0 {
                    return None;
                }
                lower[(row, col)] = sum.sqrt();
            } else {
                let denom = lower[(col, col)];
                if denom <= 0.0 {
                    return None;
                }
                lower[(row, col)] = sum / denom;
            }
        }
    }
    Some(lower)
}

/// `ln |A|` for `A = L L^T` given the lower factor `L`.
#[must_use]
pub fn cholesky_log_determinant(lower: &Mat<f64>) -> f64 {
    (0..lower.ncols())
        .map(|idx| 2.0 * lower[(idx, idx)].ln())
        .sum()
}

/// Solve `L y = rhs` for lower-triangular `L` by forward substitution.
#[must_use]
pub fn forward_substitute(lower: &Mat<f64>, rhs: &[f64]) -> Vec<f64> {
    let dim = rhs.len();
    let mut solution = vec![0.0; dim];
    for row in 0..dim {
        let mut sum = rhs[row];
        for col in 0..row {
            sum -= lower[(row, col)] * solution[col];
        }
        solution[row] = sum / lower[(row, row)];
    }
    solution
}

/// Solve `A x = b` with a full-pivot LU decomposition.
#[must_use]
pub fn solve_linear_system(a: &Mat<f64>, b: &Mat<f64>) -> Option<Mat<f64>> {
    let rhs = b.clone();
    let lu = a.full_piv_lu();
    let solution = lu.solve(rhs);
    if matrix_is_finite(&solution) {
        Some(solution)
    } else {
        None
    }
}

#[must_use]
pub fn matrix_inverse(matrix: &Mat<f64>) -> Option<Mat<f64>> {
    let dim = matrix.ncols();
    let mut inverse = Mat::<f64>::zeros(dim, dim);

    for col in 0..dim {
        let basis = Mat::from_fn(dim, 1, |row, _| if row == col { 1.0 } else { 0.0 });
        let solution = solve_linear_system(matrix, &basis)?;
        for row in 0..dim {
            inverse[(row, col)] = solution[(row, 0)];
        }
    }

    Some(inverse)
}

/// `tr(A B)` without forming the product.
#[must_use]
pub fn trace_of_product(a: &Mat<f64>, b: &Mat<f64>) -> f64 {
    let mut trace = 0.0;
    for row in 0..a.nrows() {
        for col in 0..a.ncols() {
            trace += a[(row, col)] * b[(col, row)];
        }
    }
    trace
}

/// Normalize a covariance matrix to a correlation matrix via
/// `Corr = D * Sigma * D` with `D = diag(1 / sqrt(diag(Sigma)))`.
#[must_use]
pub fn correlation_from_covariance(covariance: &Mat<f64>) -> Mat<f64> {
    let dim = covariance.ncols();
    let inverse_sds: Vec<f64> = (0..dim)
        .map(|idx| {
            let variance = covariance[(idx, idx)];
            if variance > 0.0 { 1.0 / variance.sqrt() } else { 0.0 }
        })
        .collect();
    Mat::from_fn(dim, dim, |row, col| {
        covariance[(row, col)] * inverse_sds[row] * inverse_sds[col]
    })
}

#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cholesky_recovers_simple_factor() {
        let matrix = Mat::from_fn(2, 2, |row, col| if row == col { 4.0 } else { 2.0 });
        let lower = cholesky_lower(&matrix).expect("matrix is positive definite");
        assert_relative_eq!(lower[(0, 0)], 2.0);
        assert_relative_eq!(lower[(1, 0)], 1.0);
        assert_relative_eq!(lower[(1, 1)], 3.0_f64.sqrt());
    }

    #[test]
    fn cholesky_rejects_indefinite_matrix() {
        let matrix = Mat::from_fn(2, 2, |row, col| if row == col { 1.0 } else { 2.0 });
        assert!(cholesky_lower(&matrix).is_none());
    }

    #[test]
    fn log_determinant_matches_product_of_pivots() {
        let matrix = Mat::from_fn(2, 2, |row, col| if row == col { 4.0 } else { 0.0 });
        let lower = cholesky_lower(&matrix).expect("diagonal matrix");
        assert_relative_eq!(
            cholesky_log_determinant(&lower),
            16.0_f64.ln(),
            epsilon = 1.0e-12
        );
    }

    #[test]
    fn forward_substitution_solves_triangular_system() {
        let lower = Mat::from_fn(2, 2, |row, col| {
            if row == col {
                2.0
            } else if row > col {
                1.0
            } else {
                0.0
            }
        });
        let solution = forward_substitute(&lower, &[2.0, 5.0]);
        assert_relative_eq!(solution[0], 1.0);
        assert_relative_eq!(solution[1], 2.0);
    }

    #[test]
    fn matrix_inverse_inverts_diagonal() {
        let matrix = Mat::from_fn(2, 2, |row, col| if row == col { 2.0 } else { 0.0 });
        let inverse = matrix_inverse(&matrix).expect("invertible matrix");
        assert_relative_eq!(inverse[(0, 0)], 0.5);
        assert_relative_eq!(inverse[(1, 1)], 0.5);
    }

    #[test]
    fn trace_of_product_matches_direct_computation() {
        let a = Mat::from_fn(2, 2, |row, col| usize_to_f64(row + col) + 1.0);
        let b = identity_matrix(2);
        assert_relative_eq!(trace_of_product(&a, &b), a[(0, 0)] + a[(1, 1)]);
    }

    #[test]
    fn correlation_has_unit_diagonal() {
        let covariance = Mat::from_fn(2, 2, |row, col| if row == col { 4.0 } else { 1.0 });
        let correlation = correlation_from_covariance(&covariance);
        assert_relative_eq!(correlation[(0, 0)], 1.0);
        assert_relative_eq!(correlation[(1, 1)], 1.0);
        assert_relative_eq!(correlation[(0, 1)], 0.25);
    }

    #[test]
    fn matrix_is_finite_detects_nan() {
        let matrix = Mat::from_fn(2, 1, |i, _| if i == 0 { 1.0 } else { f64::NAN });
        assert!(!matrix_is_finite(&matrix));
    }
}
