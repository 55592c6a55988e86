//! The fit pipeline behind `galscale fit`.
//!
//! sim setup -> face-on halo profiles -> `GalaxyScales` -> all three estimates
//!
//! The snapshot source is a parameter so tests can run the same sequence
//! against an in-memory simulation.

use log::info;

use crate::domain::{FitConfig, ScaleOutcome};
use crate::error::AppError;
use crate::fit::FitOptions;
use crate::math::LmOptions;
use crate::profile::{HaloProfiles, halo_profiles};
use crate::scales::GalaxyScales;
use crate::sim::{FaceOnOptions, Halo, JsonSnapshotSource, SimulationSource, Snapshot, sim_setup};

/// All computed outputs of a single `galscale fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub profiles: HaloProfiles,
    pub scales: GalaxyScales,
    pub outcomes: Vec<ScaleOutcome>,
}

/// Run the pipeline on the JSON snapshot named in `config`.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let source = JsonSnapshotSource::new(FaceOnOptions {
        disk_size: config.disk_size,
        ..FaceOnOptions::default()
    });
    run_fit_with_source(config, &source)
}

/// Run the pipeline with any source that yields the bundled snapshot types.
pub fn run_fit_with_source<S>(config: &FitConfig, source: &S) -> Result<RunOutput, AppError>
where
    S: SimulationSource<Snapshot = Snapshot, Halo = Halo>,
{
    let setup = sim_setup(source, &config.snapshot_path)?;
    analyze_halo(&setup.snapshot, &setup.halo, config)
}

/// Profile a face-on halo and estimate its scales.
pub fn analyze_halo(snapshot: &Snapshot, halo: &Halo, config: &FitConfig) -> Result<RunOutput, AppError> {
    info!("profiling halo {}", halo.number);
    let profiles = halo_profiles(snapshot, halo, &config.profile)?;

    let (lo, hi) = config.radial_window;
    let scales = profiles
        .galaxy_scales()?
        .with_radial_window(lo, hi)?
        .with_options(fit_options(config));

    info!("fitting scales");
    let outcomes = scales.estimate_all();

    Ok(RunOutput {
        profiles,
        scales,
        outcomes,
    })
}

pub fn fit_options(config: &FitConfig) -> FitOptions {
    FitOptions {
        lm: LmOptions {
            max_iterations: config.max_iterations,
            ..LmOptions::default()
        },
        seed_steps: config.seed_steps,
        ..FitOptions::default()
    }
}
