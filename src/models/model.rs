//! Model evaluation for the three profile shapes.
//!
//! The fitters rely on three primitive operations:
//! - build a design row for a given abscissa (linear-in-parameter models, for OLS)
//! - predict `y(x)` given the parameter vector (for residuals/plots)
//! - the Jacobian row `∂y/∂p` (for Levenberg–Marquardt)
//!
//! The named shape functions (`linear`, `quad_cen`, `sech2`) are plain
//! `f(x, params...)` functions so each can be checked on its own.

use crate::domain::ProfileModel;

/// `y = m·x + b`.
pub fn linear(x: f64, m: f64, b: f64) -> f64 {
    m * x + b
}

/// `y = p2·z² + c` (parabola centred on the midplane).
pub fn quad_cen(z: f64, p2: f64, c: f64) -> f64 {
    p2 * z * z + c
}

/// `y = amp·cosh(z·z0)^-2`.
pub fn sech2(z: f64, z0: f64, amp: f64) -> f64 {
    amp * sech_squared(z * z0)
}

/// `sech²(u)`; underflows to 0 for large `|u|` instead of producing `inf/inf`.
pub fn sech_squared(u: f64) -> f64 {
    let s = 1.0 / u.cosh();
    s * s
}

/// Fill a design row for a model that is linear in its parameters.
///
/// The row has one column per parameter, in parameter order.
///
/// # Panics
/// Panics if `out` is shorter than `model.param_len()`, or if `model` is not
/// linear in its parameters (see `ProfileModel::is_linear_in_params`).
pub fn fill_design_row(model: ProfileModel, x: f64, out: &mut [f64]) {
    match model {
        ProfileModel::Linear => {
            out[0] = x;
            out[1] = 1.0;
        }
        ProfileModel::Parabolic => {
            out[0] = x * x;
            out[1] = 1.0;
        }
        ProfileModel::Sech2 => unreachable!("sech^2 has no design row; it is nonlinear in z0"),
    }
}

/// Predict `y(x)` for the given model and parameter vector.
pub fn predict(model: ProfileModel, x: f64, params: &[f64]) -> f64 {
    match model {
        ProfileModel::Linear => linear(x, params[0], params[1]),
        ProfileModel::Parabolic => quad_cen(x, params[0], params[1]),
        ProfileModel::Sech2 => sech2(x, params[0], params[1]),
    }
}

/// Fill the Jacobian row `∂y/∂p` at `x`.
pub fn fill_jacobian_row(model: ProfileModel, x: f64, params: &[f64], out: &mut [f64]) {
    match model {
        ProfileModel::Linear | ProfileModel::Parabolic => fill_design_row(model, x, out),
        ProfileModel::Sech2 => {
            let (z0, amp) = (params[0], params[1]);
            let u = x * z0;
            let s2 = sech_squared(u);
            out[0] = -2.0 * amp * s2 * u.tanh() * x;
            out[1] = s2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_is_a_straight_line() {
        assert_eq!(linear(0.0, 2.0, 3.0), 3.0);
        assert_eq!(linear(2.0, -0.5, 1.0), 0.0);
    }

    #[test]
    fn quad_cen_is_even_in_z() {
        let (p2, c) = (-0.7, 4.0);
        assert_eq!(quad_cen(0.0, p2, c), c);
        assert_eq!(quad_cen(1.3, p2, c), quad_cen(-1.3, p2, c));
    }

    #[test]
    fn sech2_peaks_at_midplane_and_decays() {
        assert_eq!(sech2(0.0, 2.5, 10.0), 10.0);
        assert!(sech2(1.0, 2.5, 10.0) < sech2(0.5, 2.5, 10.0));
        // Symmetric in z and in the sign of z0.
        assert_relative_eq!(sech2(0.8, 2.5, 10.0), sech2(-0.8, 2.5, 10.0));
        assert_relative_eq!(sech2(0.8, 2.5, 10.0), sech2(0.8, -2.5, 10.0));
    }

    #[test]
    fn sech2_far_tail_is_zero_not_nan() {
        let y = sech2(1.0e4, 10.0, 1.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    #[should_panic(expected = "no design row")]
    fn sech2_has_no_design_row() {
        let mut row = [0.0; 2];
        fill_design_row(ProfileModel::Sech2, 0.3, &mut row);
    }

    #[test]
    fn sech2_jacobian_matches_finite_difference() {
        let params = [1.7, 3.0];
        let x = 0.45;
        let mut row = [0.0; 2];
        fill_jacobian_row(ProfileModel::Sech2, x, &params, &mut row);

        let h = 1e-6;
        for k in 0..2 {
            let mut hi = params;
            let mut lo = params;
            hi[k] += h;
            lo[k] -= h;
            let fd = (predict(ProfileModel::Sech2, x, &hi) - predict(ProfileModel::Sech2, x, &lo))
                / (2.0 * h);
            assert_relative_eq!(row[k], fd, max_relative = 1e-6);
        }
    }
}
