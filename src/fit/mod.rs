//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - closed-form least squares for log-linear / log-parabolic profiles
//! - seed grid search (parallel) + Levenberg–Marquardt for sech²
//! - covariance and fit diagnostics for every model

pub mod fitter;
pub mod nonlinear;

pub use fitter::*;
pub use nonlinear::*;
