//! Command-line parsing for `galscale`.
//!
//! Argument parsing and command dispatch stay separate from the
//! profile/fitting code: flags are collected here and turned into plain config
//! structs by `crate::app`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::RadialQuantity;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "galscale", version, about = "Disk scale length / scale height estimator for simulated galaxies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a snapshot, turn halo 1 face-on, and fit its scale length and heights.
    Fit(FitArgs),
    /// Write a synthetic disk-galaxy snapshot with known structure.
    Synth(SynthArgs),
}

/// Options for `galscale fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Snapshot JSON file.
    #[arg(short = 's', long, value_name = "PATH")]
    pub snapshot: PathBuf,

    /// Inner edge (kpc, exclusive) of the scale-length fit window.
    #[arg(long, default_value_t = 5.0)]
    pub r_min: f64,

    /// Outer edge (kpc, exclusive) of the scale-length fit window.
    #[arg(long, default_value_t = 20.0)]
    pub r_max: f64,

    /// Outer edge (kpc) of the radial profile.
    #[arg(long, default_value_t = 25.0)]
    pub radial_max: f64,

    /// Number of radial bins.
    #[arg(long, default_value_t = 50)]
    pub radial_bins: usize,

    /// What the radial profile measures per bin.
    #[arg(long, value_enum, default_value_t = RadialQuantity::SurfaceDensity)]
    pub radial_quantity: RadialQuantity,

    /// Half-height (kpc) of the vertical profile.
    #[arg(long, default_value_t = 2.0)]
    pub z_max: f64,

    /// Number of vertical bins.
    #[arg(long, default_value_t = 40)]
    pub z_bins: usize,

    /// Only stars inside this cylindrical radius (kpc) enter the vertical profile.
    #[arg(long, default_value_t = 20.0)]
    pub disk_radius: f64,

    /// Radius (kpc) whose angular momentum defines the disk plane.
    #[arg(long, default_value_t = 5.0)]
    pub disk_size: f64,

    /// Iteration cap for the sech² solver.
    #[arg(long, default_value_t = 200)]
    pub max_iter: usize,

    /// Seed grid size for the sech² solver.
    #[arg(long, default_value_t = 60)]
    pub seed_steps: usize,

    /// Render ASCII profile plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,

    /// Export the run report (estimates + fits) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export the radial and vertical profiles to CSV.
    #[arg(long = "export-profiles", value_name = "CSV")]
    pub export_profiles: Option<PathBuf>,
}

/// Options for `galscale synth`.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output snapshot JSON file.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: PathBuf,

    /// Number of disk star particles.
    #[arg(short = 'n', long, default_value_t = 20_000)]
    pub stars: usize,

    /// Number of dark particles in the main halo.
    #[arg(long, default_value_t = 5_000)]
    pub dm: usize,

    /// Disk scale length (kpc).
    #[arg(long, default_value_t = 3.0)]
    pub scale_length: f64,

    /// Disk scale height (kpc).
    #[arg(long, default_value_t = 0.3)]
    pub scale_height: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
