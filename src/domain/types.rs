//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - printed in terminal reports

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Analytic profile shape fitted to a mass profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileModel {
    /// `y = m·x + b`, fitted to `ln(mass)` against radius.
    Linear,
    /// `y = p2·z² + c`, fitted to `ln(mass)` against height.
    Parabolic,
    /// `y = amp·cosh(z·z0)^-2`, fitted to mass against height.
    Sech2,
}

impl ProfileModel {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ProfileModel::Linear => "exponential (log-linear)",
            ProfileModel::Parabolic => "gaussian (log-parabolic)",
            ProfileModel::Sech2 => "sech^2",
        }
    }

    /// Number of free parameters.
    pub fn param_len(self) -> usize {
        2
    }

    /// Parameter names, in the order used by the parameter vector.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ProfileModel::Linear => &["m", "b"],
            ProfileModel::Parabolic => &["p2", "const"],
            ProfileModel::Sech2 => &["z0", "amp"],
        }
    }

    /// Whether the model is linear in its parameters (solvable in closed form).
    pub fn is_linear_in_params(self) -> bool {
        matches!(self, ProfileModel::Linear | ProfileModel::Parabolic)
    }

    /// Whether the model is fitted to `ln(mass)` rather than mass.
    pub fn fits_log_mass(self) -> bool {
        matches!(self, ProfileModel::Linear | ProfileModel::Parabolic)
    }
}

/// Which structural scale an estimate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Length,
    HeightParabolic,
    HeightSech2,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 3] = [
        ScaleKind::Length,
        ScaleKind::HeightParabolic,
        ScaleKind::HeightSech2,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ScaleKind::Length => "scale length r_0",
            ScaleKind::HeightParabolic => "scale height z_0 (parabolic)",
            ScaleKind::HeightSech2 => "scale height z_0 (sech^2)",
        }
    }

    pub fn model(self) -> ProfileModel {
        match self {
            ScaleKind::Length => ProfileModel::Linear,
            ScaleKind::HeightParabolic => ProfileModel::Parabolic,
            ScaleKind::HeightSech2 => ProfileModel::Sech2,
        }
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    /// Degrees of freedom (`n - p`).
    pub dof: usize,
}

/// Everything the least-squares routine returns for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFit {
    pub model: ProfileModel,
    pub params: Vec<f64>,
    /// `pinv(JᵀJ) · SSE/(n-p)`; `None` when `n == p`.
    pub covariance: Option<Vec<Vec<f64>>>,
    pub std_errors: Option<Vec<f64>>,
    pub quality: FitQuality,
    /// Solver iterations (0 for closed-form fits).
    pub iterations: usize,
    pub termination: String,
}

/// A physical scale derived from a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleEstimate {
    pub kind: ScaleKind,
    /// Scale in kpc.
    pub value: f64,
    pub fit: ModelFit,
}

/// Outcome of one estimate in a batch run; failures are kept, not hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleOutcome {
    pub kind: ScaleKind,
    pub estimate: Option<ScaleEstimate>,
    pub error: Option<String>,
}

/// What the radial profile measures per bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RadialQuantity {
    /// Stellar mass in each annulus (Msol).
    Mass,
    /// Mass divided by annulus area (Msol / kpc²).
    SurfaceDensity,
}

/// Binning used to turn star particles into mass profiles.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Outer edge of the radial profile (kpc); bins start at 0.
    pub radial_max: f64,
    pub radial_bins: usize,
    pub radial_quantity: RadialQuantity,
    /// Half-height of the vertical profile (kpc); bins span `[-max, max]`.
    pub vertical_max: f64,
    pub vertical_bins: usize,
    /// Only stars with cylindrical radius below this enter the vertical profile.
    pub disk_radius: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            radial_max: 25.0,
            radial_bins: 50,
            radial_quantity: RadialQuantity::SurfaceDensity,
            vertical_max: 2.0,
            vertical_bins: 40,
            disk_radius: 20.0,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub snapshot_path: PathBuf,

    /// Exclusive radial window `(lo, hi)` for the scale-length fit (kpc).
    pub radial_window: (f64, f64),
    pub profile: ProfileConfig,

    /// Disk size used to measure angular momentum for the face-on rotation (kpc).
    pub disk_size: f64,

    pub max_iterations: usize,
    pub seed_steps: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_report: Option<PathBuf>,
    pub export_profiles: Option<PathBuf>,
}

/// A saved run report (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub snapshot: String,
    pub halo: usize,
    pub n_stars: usize,
    pub radial_window: [f64; 2],
    pub estimates: Vec<ScaleOutcome>,
}
