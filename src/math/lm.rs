//! Levenberg–Marquardt for small dense nonlinear least-squares problems.
//!
//! We minimise `F(p) = ½ Σ r_i(p)²` where `r = model(p) - y`. Each iteration
//! solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·D) δ = -Jᵀr,   D = diag(JᵀJ)
//! ```
//!
//! and accepts the step when the gain ratio (actual / predicted reduction) is
//! positive. The damping update follows Nielsen: `λ ← λ·max(1/3, 1-(2ρ-1)³)` on
//! success, `λ ← λ·ν, ν ← 2ν` on failure.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::math::ols::solve_least_squares;

/// Damping beyond which no further progress is possible in f64.
const LAMBDA_MAX: f64 = 1e16;

/// Floor for the diagonal scaling so flat directions still get damped.
const DIAG_FLOOR: f64 = 1e-12;

/// Relative Gauss–Newton step under which a saturated solve sits at a minimum.
const SETTLED_STEP: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub initial_lambda: f64,
    /// Relative reduction of the cost below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Max-norm of the gradient below which we stop.
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_lambda: 1e-3,
            ftol: 1e-14,
            xtol: 1e-12,
            gtol: 0.0,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Gradient vanished.
    Gradient,
    /// Step became negligible relative to the parameters.
    StepSize,
    /// Cost stopped decreasing.
    Cost,
    /// Damping saturated without finding a downhill step.
    Stalled,
    /// Iteration budget exhausted.
    MaxIterations,
    /// The residuals at the starting point are not finite.
    NonFinite,
}

impl Termination {
    pub fn converged(self) -> bool {
        matches!(
            self,
            Termination::Gradient | Termination::StepSize | Termination::Cost
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Gradient => "gradient below tolerance",
            Termination::StepSize => "relative step below tolerance",
            Termination::Cost => "relative cost reduction below tolerance",
            Termination::Stalled => "damping saturated, no downhill step",
            Termination::MaxIterations => "maximum number of iterations reached",
            Termination::NonFinite => "non-finite residuals at starting point",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: DVector<f64>,
    /// `Σ r²` at `params`.
    pub sse: f64,
    /// Jacobian at `params` (for covariance).
    pub jacobian: DMatrix<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

/// Run Levenberg–Marquardt from `initial`.
///
/// `residuals(p)` returns `model(p) - y`; `jacobian(p)` returns `∂r/∂p`.
pub fn levenberg_marquardt<R, J>(
    residuals: R,
    jacobian: J,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> LmOutcome
where
    R: Fn(&DVector<f64>) -> DVector<f64>,
    J: Fn(&DVector<f64>) -> DMatrix<f64>,
{
    let mut params = initial;
    let mut r = residuals(&params);
    let mut cost = 0.5 * r.norm_squared();
    let mut jac = jacobian(&params);

    let finish = |params: DVector<f64>, cost: f64, jac: DMatrix<f64>, iterations, termination| LmOutcome {
        params,
        sse: 2.0 * cost,
        jacobian: jac,
        iterations,
        termination,
    };

    if !cost.is_finite() || jac.iter().any(|v| !v.is_finite()) {
        return finish(params, cost, jac, 0, Termination::NonFinite);
    }

    let mut lambda = opts.initial_lambda;
    let mut nu = 2.0_f64;

    for iter in 1..=opts.max_iterations {
        let jt = jac.transpose();
        let jtj = &jt * &jac;
        let grad = &jt * &r;

        if grad.amax() <= opts.gtol {
            return finish(params, cost, jac, iter - 1, Termination::Gradient);
        }

        let diag = jtj.diagonal().map(|d| d.max(DIAG_FLOOR));
        let mut damped = jtj.clone();
        for i in 0..diag.len() {
            damped[(i, i)] += lambda * diag[i];
        }

        let Some(chol) = damped.cholesky() else {
            lambda *= nu;
            nu *= 2.0;
            if lambda > LAMBDA_MAX {
                let reason = saturated(&jac, &r, &params);
                return finish(params, cost, jac, iter, reason);
            }
            continue;
        };
        let step = chol.solve(&(-&grad));

        if step.norm() <= opts.xtol * (params.norm() + opts.xtol) {
            return finish(params, cost, jac, iter, Termination::StepSize);
        }

        let trial = &params + &step;
        let r_trial = residuals(&trial);
        let cost_trial = 0.5 * r_trial.norm_squared();

        let predicted = 0.5 * step.dot(&(step.component_mul(&diag) * lambda - &grad));
        let actual = cost - cost_trial;

        if cost_trial.is_finite() && predicted > 0.0 && actual > 0.0 {
            let rho = actual / predicted;
            let previous = cost;

            params = trial;
            r = r_trial;
            cost = cost_trial;
            jac = jacobian(&params);

            lambda *= (1.0_f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
            nu = 2.0;

            if actual <= opts.ftol * previous {
                return finish(params, cost, jac, iter, Termination::Cost);
            }
        } else {
            lambda *= nu;
            nu *= 2.0;
            if lambda > LAMBDA_MAX {
                let reason = saturated(&jac, &r, &params);
                return finish(params, cost, jac, iter, reason);
            }
        }
    }

    finish(params, cost, jac, opts.max_iterations, Termination::MaxIterations)
}

/// Reason to report once damping saturates. Rounding alone stops progress at a
/// minimum, where the undamped step is negligible; anything else is a stall.
fn saturated(jac: &DMatrix<f64>, r: &DVector<f64>, params: &DVector<f64>) -> Termination {
    match solve_least_squares(jac, &(-r)) {
        Some(step) if step.norm() <= SETTLED_STEP * (params.norm() + SETTLED_STEP) => Termination::StepSize,
        _ => Termination::Stalled,
    }
}
