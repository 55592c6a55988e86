//! Scale length and scale height of a disk galaxy from mass profiles.
//!
//! Three estimators, each independent of the others:
//!
//! - `scale_length`: `ln(mass)` vs radius inside an exclusive window (default
//!   5–20 kpc) fitted by a line; `r_0 = -1/m`
//! - `scale_height_parab`: `ln(mass)` vs height fitted by `p2·z² + c`;
//!   `z_0 = sqrt(-1/p2)`
//! - `scale_height_sech2`: mass vs height fitted by `amp·sech²(z·z0)`;
//!   `z_0 = |-1/z0|`
//!
//! Non-positive masses where a logarithm is taken and back-transforms outside
//! their domain are reported as domain errors instead of being left to NaN.

use log::warn;

use crate::domain::{ModelFit, ProfileModel, ScaleEstimate, ScaleKind, ScaleOutcome};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_linear_model, fit_sech2};

/// Exclusive radial window (kpc) used for the scale-length fit.
pub const DEFAULT_RADIAL_WINDOW: (f64, f64) = (5.0, 20.0);

#[derive(Debug, Clone)]
pub struct GalaxyScales {
    radius: Vec<f64>,
    mass_rad: Vec<f64>,
    z_dir: Vec<f64>,
    mass_z_dir: Vec<f64>,
    radial_window: (f64, f64),
    options: FitOptions,
}

impl GalaxyScales {
    /// Build from radial and vertical profiles.
    ///
    /// `radius`/`mass_rad` and `z_dir`/`mass_z_dir` must be index-aligned pairs.
    pub fn new(
        radius: Vec<f64>,
        mass_rad: Vec<f64>,
        z_dir: Vec<f64>,
        mass_z_dir: Vec<f64>,
    ) -> Result<Self, AppError> {
        if radius.len() != mass_rad.len() {
            return Err(AppError::input(format!(
                "radius and mass_rad differ in length ({} vs {}).",
                radius.len(),
                mass_rad.len()
            )));
        }
        if z_dir.len() != mass_z_dir.len() {
            return Err(AppError::input(format!(
                "z_dir and mass_z_dir differ in length ({} vs {}).",
                z_dir.len(),
                mass_z_dir.len()
            )));
        }
        Ok(Self {
            radius,
            mass_rad,
            z_dir,
            mass_z_dir,
            radial_window: DEFAULT_RADIAL_WINDOW,
            options: FitOptions::default(),
        })
    }

    /// Replace the exclusive radial window used by `scale_length`.
    pub fn with_radial_window(mut self, lo: f64, hi: f64) -> Result<Self, AppError> {
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(AppError::input(format!(
                "Invalid radial window ({lo}, {hi}); need finite bounds with hi > lo."
            )));
        }
        self.radial_window = (lo, hi);
        Ok(self)
    }

    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn radius(&self) -> &[f64] {
        &self.radius
    }

    pub fn mass_rad(&self) -> &[f64] {
        &self.mass_rad
    }

    pub fn z_dir(&self) -> &[f64] {
        &self.z_dir
    }

    pub fn mass_z_dir(&self) -> &[f64] {
        &self.mass_z_dir
    }

    pub fn radial_window(&self) -> (f64, f64) {
        self.radial_window
    }

    /// Radial pairs strictly inside the window, in their original order.
    pub fn windowed_radial(&self) -> (Vec<f64>, Vec<f64>) {
        let (lo, hi) = self.radial_window;
        self.radius
            .iter()
            .zip(&self.mass_rad)
            .filter(|&(&r, _)| r > lo && r < hi)
            .map(|(&r, &m)| (r, m))
            .unzip()
    }

    /// Samples for plotting a fit: log-mass for the log-space models, raw mass
    /// for sech². Non-positive masses are dropped here, whereas the estimators
    /// reject them with a domain error.
    pub fn fit_samples(&self, kind: ScaleKind) -> (Vec<f64>, Vec<f64>) {
        let (x, y) = match kind {
            ScaleKind::Length => self.windowed_radial(),
            ScaleKind::HeightParabolic | ScaleKind::HeightSech2 => (self.z_dir.clone(), self.mass_z_dir.clone()),
        };
        if !kind.model().fits_log_mass() {
            return (x, y);
        }
        x.into_iter()
            .zip(y)
            .filter(|&(_, m)| m > 0.0 && m.is_finite())
            .map(|(x, m)| (x, m.ln()))
            .unzip()
    }

    /// Scale length `r_0` in kpc.
    pub fn scale_length(&self) -> Result<f64, AppError> {
        self.scale_length_fit().map(|e| e.value)
    }

    /// Scale height `z_0` in kpc from the log-parabolic fit.
    pub fn scale_height_parab(&self) -> Result<f64, AppError> {
        self.scale_height_parab_fit().map(|e| e.value)
    }

    /// Scale height `z_0` in kpc from the sech² fit.
    pub fn scale_height_sech2(&self) -> Result<f64, AppError> {
        self.scale_height_sech2_fit().map(|e| e.value)
    }

    pub fn scale_length_fit(&self) -> Result<ScaleEstimate, AppError> {
        let (r, m) = self.windowed_radial();
        let (lo, hi) = self.radial_window;
        if r.len() < 2 {
            return Err(AppError::fitting(format!(
                "Only {} radial samples inside ({lo}, {hi}) kpc; need at least 2.",
                r.len()
            )));
        }
        let log_mass = log_masses(&m, "mass_rad")?;
        let fit = fit_linear_model(ProfileModel::Linear, &r, &log_mass)?;
        let value = scale_length_from_slope(fit.params[0])?;
        Ok(scale_estimate(ScaleKind::Length, value, fit))
    }

    pub fn scale_height_parab_fit(&self) -> Result<ScaleEstimate, AppError> {
        let log_mass = log_masses(&self.mass_z_dir, "mass_z_dir")?;
        let fit = fit_linear_model(ProfileModel::Parabolic, &self.z_dir, &log_mass)?;
        let value = scale_height_from_quadratic(fit.params[0])?;
        Ok(scale_estimate(ScaleKind::HeightParabolic, value, fit))
    }

    pub fn scale_height_sech2_fit(&self) -> Result<ScaleEstimate, AppError> {
        let fit = fit_sech2(&self.z_dir, &self.mass_z_dir, &self.options)?;
        let value = scale_height_from_sech2(fit.params[0])?;
        Ok(scale_estimate(ScaleKind::HeightSech2, value, fit))
    }

    /// Run one estimator by kind.
    pub fn estimate(&self, kind: ScaleKind) -> Result<ScaleEstimate, AppError> {
        match kind {
            ScaleKind::Length => self.scale_length_fit(),
            ScaleKind::HeightParabolic => self.scale_height_parab_fit(),
            ScaleKind::HeightSech2 => self.scale_height_sech2_fit(),
        }
    }

    /// Run every estimator; a failure in one does not affect the others.
    pub fn estimate_all(&self) -> Vec<ScaleOutcome> {
        ScaleKind::ALL
            .iter()
            .map(|&kind| match self.estimate(kind) {
                Ok(est) => ScaleOutcome {
                    kind,
                    estimate: Some(est),
                    error: None,
                },
                Err(err) => {
                    warn!("{} failed: {err}", kind.display_name());
                    ScaleOutcome {
                        kind,
                        estimate: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect()
    }
}

fn scale_estimate(kind: ScaleKind, value: f64, fit: ModelFit) -> ScaleEstimate {
    ScaleEstimate { kind, value, fit }
}

fn log_masses(mass: &[f64], name: &str) -> Result<Vec<f64>, AppError> {
    if let Some(i) = mass.iter().position(|&m| !(m > 0.0 && m.is_finite())) {
        return Err(AppError::domain(format!(
            "{name}[{i}] = {} is not a positive finite mass; its logarithm is undefined.",
            mass[i]
        )));
    }
    Ok(mass.iter().map(|m| m.ln()).collect())
}

/// `r_0 = -1/m`; a non-decreasing profile has no scale length.
pub fn scale_length_from_slope(slope: f64) -> Result<f64, AppError> {
    if !slope.is_finite() || slope >= 0.0 {
        return Err(AppError::domain(format!(
            "Fitted log-mass slope {slope} is not negative; r_0 = -1/m is undefined."
        )));
    }
    Ok(-1.0 / slope)
}

/// `z_0 = sqrt(-1/p2)`; requires a downward parabola.
pub fn scale_height_from_quadratic(p2: f64) -> Result<f64, AppError> {
    if !p2.is_finite() || p2 >= 0.0 {
        return Err(AppError::domain(format!(
            "Fitted quadratic coefficient {p2} is not negative; sqrt(-1/p2) is undefined."
        )));
    }
    Ok((-1.0 / p2).sqrt())
}

/// `z_0 = |-1/z0|`; the sign of `z0` carries no information.
pub fn scale_height_from_sech2(z0: f64) -> Result<f64, AppError> {
    if !z0.is_finite() || z0 == 0.0 {
        return Err(AppError::domain(format!(
            "Fitted sech^2 parameter z0 = {z0}; |-1/z0| is undefined."
        )));
    }
    Ok((-1.0 / z0).abs())
}
