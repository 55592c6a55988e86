//! Ordinary least squares and parameter covariance.
//!
//! The linear-in-parameter profiles (log-linear, log-parabolic) reduce to
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! which we solve through an SVD of the design matrix. The SVD also tells us
//! when the design is rank deficient (e.g. every radius identical), which is
//! reported as "no solution" rather than a silently chosen minimum-norm answer.
//! (Nalgebra's `QR::solve` is intended for square systems and will panic for
//! non-square matrices.)

use nalgebra::{DMatrix, DVector, Dyn, SVD};

/// Relative singular-value cutoff, scaled like LAPACK's `gelsd` default.
fn rank_tolerance(max_singular: f64, rows: usize, cols: usize) -> f64 {
    max_singular * rows.max(cols) as f64 * f64::EPSILON
}

/// SVD of `x` and its rank cutoff, or `None` when `x` has fewer rows than
/// columns, a non-finite or zero spectrum, or dependent columns.
fn full_rank_svd(x: &DMatrix<f64>) -> Option<(SVD<f64, Dyn, Dyn>, f64)> {
    if x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }

    let tol = rank_tolerance(max_sv, x.nrows(), x.ncols());
    if svd.rank(tol) < x.ncols() {
        return None;
    }
    Some((svd, tol))
}

/// True when the columns of `x` are linearly independent (same cutoff as
/// `solve_least_squares`).
pub fn full_column_rank(x: &DMatrix<f64>) -> bool {
    full_rank_svd(x).is_some()
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the design matrix is rank deficient or the solution is not
/// finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() {
        return None;
    }
    let (svd, tol) = full_rank_svd(x)?;

    let beta = svd.solve(y, tol).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// Parameter covariance `pinv(JᵀJ) · SSE / (n - p)`.
///
/// Returns `None` when there are no residual degrees of freedom or the normal
/// matrix cannot be pseudo-inverted.
pub fn covariance(jacobian: &DMatrix<f64>, sse: f64) -> Option<DMatrix<f64>> {
    let (n, p) = jacobian.shape();
    if n <= p || !sse.is_finite() {
        return None;
    }

    let jtj = jacobian.transpose() * jacobian;
    let svd = jtj.svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }
    let pinv = svd.pseudo_inverse(rank_tolerance(max_sv, p, p)).ok()?;

    let s_sq = sse / (n - p) as f64;
    let cov = pinv * s_sq;
    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

/// Square roots of the covariance diagonal.
pub fn std_errors(cov: &DMatrix<f64>) -> Vec<f64> {
    cov.diagonal().iter().map(|v| v.max(0.0).sqrt()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 3x + 2 on x = [0,1,2]; columns are [x, 1].
        let x = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(beta[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn least_squares_rejects_rank_deficient_design() {
        // Every x identical: slope and intercept are not separately identifiable.
        let x = DMatrix::from_row_slice(3, 2, &[4.0, 1.0, 4.0, 1.0, 4.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn column_rank_detects_proportional_columns() {
        let dependent = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 0.5, 1.0, -3.0, -6.0]);
        assert!(!full_column_rank(&dependent));

        let zero_column = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 0.0, 0.5, 0.0, 0.2]);
        assert!(!full_column_rank(&zero_column));

        let independent = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        assert!(full_column_rank(&independent));
    }

    #[test]
    fn least_squares_rejects_underdetermined_system() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn covariance_matches_textbook_slope_variance() {
        // For y = m x + b, var(m) = s² / Σ(x - x̄)².
        let xs = [0.0, 1.0, 2.0, 3.0];
        let x = DMatrix::from_fn(4, 2, |i, j| if j == 0 { xs[i] } else { 1.0 });
        let sse = 2.0;
        let cov = covariance(&x, sse).unwrap();

        let s_sq = sse / 2.0;
        let sxx = 5.0; // Σ(x - 1.5)²
        assert_relative_eq!(cov[(0, 0)], s_sq / sxx, max_relative = 1e-10);
        assert_relative_eq!(std_errors(&cov)[0], (s_sq / sxx).sqrt(), max_relative = 1e-10);
    }

    #[test]
    fn covariance_needs_degrees_of_freedom() {
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 1.0]);
        assert!(covariance(&x, 0.0).is_none());
    }
}
