//! Least-squares fitting of a single profile model.
//!
//! Given abscissae `x_i` and observed values `y_i` we return the best-fit
//! parameter vector together with what a curve-fitting routine normally hands
//! back: covariance, standard errors, SSE/RMSE and solver diagnostics.
//!
//! - log-linear and log-parabolic models are linear in their parameters and are
//!   solved in closed form (SVD least squares)
//! - sech² is nonlinear in `z0` and goes through `fit::nonlinear`

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitQuality, ModelFit, ProfileModel};
use crate::error::AppError;
use crate::math::{LmOptions, covariance, solve_least_squares, std_errors};
use crate::models::{fill_design_row, predict};

/// Options that affect how nonlinear models are calibrated.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub lm: LmOptions,
    /// Number of log-spaced `z0` candidates used to seed the sech² fit.
    pub seed_steps: usize,
    /// Seed range for `z0`, as multiples of `1 / max|z|`.
    pub seed_range: (f64, f64),
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            lm: LmOptions::default(),
            seed_steps: 60,
            seed_range: (0.1, 1000.0),
        }
    }
}

/// Closed-form fit for a model that is linear in its parameters.
pub fn fit_linear_model(model: ProfileModel, x: &[f64], y: &[f64]) -> Result<ModelFit, AppError> {
    if !model.is_linear_in_params() {
        return Err(AppError::input(format!(
            "Model {} is not linear in its parameters.",
            model.display_name()
        )));
    }
    validate_samples(model, x, y)?;

    let n = x.len();
    let p = model.param_len();

    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &xi) in x.iter().enumerate() {
        fill_design_row(model, xi, &mut row);
        for (j, &v) in row.iter().enumerate() {
            design[(i, j)] = v;
        }
    }
    let obs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &obs).ok_or_else(|| {
        AppError::fitting(format!(
            "Degenerate design matrix for the {} fit (n={n}); the abscissae do not determine {} parameters.",
            model.display_name(),
            p
        ))
    })?;
    let params: Vec<f64> = beta.iter().copied().collect();

    let sse = sum_squared_residuals(model, x, y, &params);
    Ok(build_model_fit(model, params, &design, sse, 0, "closed-form least squares"))
}

/// Reject inputs no least-squares routine can work with.
pub(crate) fn validate_samples(model: ProfileModel, x: &[f64], y: &[f64]) -> Result<(), AppError> {
    if x.len() != y.len() {
        return Err(AppError::input(format!(
            "Sample arrays differ in length: x={}, y={}.",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(AppError::fitting("No data points to fit."));
    }
    let p = model.param_len();
    if x.len() < p {
        return Err(AppError::fitting(format!(
            "The {} fit needs at least {p} points, got {}.",
            model.display_name(),
            x.len()
        )));
    }
    if let Some(i) = x.iter().zip(y).position(|(a, b)| !(a.is_finite() && b.is_finite())) {
        return Err(AppError::fitting(format!(
            "Non-finite sample at index {i}: x={}, y={}.",
            x[i], y[i]
        )));
    }
    Ok(())
}

pub(crate) fn sum_squared_residuals(model: ProfileModel, x: &[f64], y: &[f64], params: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - predict(model, xi, params);
            r * r
        })
        .sum()
}

/// Assemble a `ModelFit` from parameters and the Jacobian at the solution.
pub(crate) fn build_model_fit(
    model: ProfileModel,
    params: Vec<f64>,
    jacobian: &DMatrix<f64>,
    sse: f64,
    iterations: usize,
    termination: impl Into<String>,
) -> ModelFit {
    let n = jacobian.nrows();
    let p = params.len();
    let cov = covariance(jacobian, sse);
    let std_errors = cov.as_ref().map(std_errors);
    let covariance = cov.map(|c| {
        c.row_iter()
            .map(|r| r.iter().copied().collect::<Vec<f64>>())
            .collect()
    });

    ModelFit {
        model,
        params,
        covariance,
        std_errors,
        quality: FitQuality {
            sse,
            rmse: (sse / n as f64).sqrt(),
            n,
            dof: n.saturating_sub(p),
        },
        iterations,
        termination: termination.into(),
    }
}
