//! Grid helpers.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::input(format!(
            "Invalid log-grid range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::input("Log-grid steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Generate `bins + 1` evenly spaced bin edges over `[min, max]`.
pub fn lin_edges(min: f64, max: f64, bins: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::input(format!(
            "Invalid bin range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if bins == 0 {
        return Err(AppError::input("Bin count must be >= 1."));
    }
    let width = (max - min) / bins as f64;
    Ok((0..=bins).map(|i| min + width * i as f64).collect())
}
