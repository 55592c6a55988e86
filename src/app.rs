//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - initialises logging
//! - parses CLI arguments
//! - runs the fit pipeline or the synthetic-snapshot writer
//! - prints reports/plots and writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{Cli, Command, FitArgs, SynthArgs};
use crate::data::{SynthConfig, generate_galaxy};
use crate::domain::{FitConfig, ProfileConfig, ScaleOutcome};
use crate::error::AppError;
use crate::scales::GalaxyScales;

pub mod pipeline;

/// Entry point for the `galscale` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // A logger may already be installed (tests, embedding); keep it.
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config, &run.profiles, &run.outcomes)
    );

    if config.plot {
        println!("{}", render_plots(&run.scales, &run.outcomes, &config));
    }

    if let Some(path) = &config.export_report {
        let report = crate::io::build_report(&config.snapshot_path, &run.profiles, config.radial_window, &run.outcomes);
        crate::io::write_report_json(path, &report)?;
        info!("wrote report {}", path.display());
    }
    if let Some(path) = &config.export_profiles {
        crate::io::write_profiles_csv(path, &run.profiles)?;
        info!("wrote profiles {}", path.display());
    }

    Ok(())
}

fn render_plots(scales: &GalaxyScales, outcomes: &[ScaleOutcome], config: &FitConfig) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let (x, y) = scales.fit_samples(outcome.kind);
        let model = outcome.kind.model();
        let title = if model.fits_log_mass() {
            format!("{} | ln(profile)", outcome.kind.display_name())
        } else {
            format!("{} | profile", outcome.kind.display_name())
        };
        let fit = outcome.estimate.as_ref().map(|e| &e.fit);
        out.push_str(&crate::plot::render_fit_plot(
            &title,
            &x,
            &y,
            fit,
            config.plot_width,
            config.plot_height,
        ));
        out.push('\n');
    }
    out
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let snapshot = generate_galaxy(&config)?;
    crate::io::write_snapshot_json(&args.output, &snapshot)?;
    info!(
        "wrote {} particles to {} (L={} kpc, H={} kpc, seed={})",
        snapshot.particles.len(),
        args.output.display(),
        config.scale_length,
        config.scale_height,
        config.seed
    );
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        snapshot_path: args.snapshot.clone(),
        radial_window: (args.r_min, args.r_max),
        profile: ProfileConfig {
            radial_max: args.radial_max,
            radial_bins: args.radial_bins,
            radial_quantity: args.radial_quantity,
            vertical_max: args.z_max,
            vertical_bins: args.z_bins,
            disk_radius: args.disk_radius,
        },
        disk_size: args.disk_size,
        max_iterations: args.max_iter,
        seed_steps: args.seed_steps,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_report: args.export.clone(),
        export_profiles: args.export_profiles.clone(),
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        stars: args.stars,
        dm: args.dm,
        scale_length: args.scale_length,
        scale_height: args.scale_height,
        seed: args.seed,
        ..SynthConfig::default()
    }
}
