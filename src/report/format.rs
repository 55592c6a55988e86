//! Terminal summary of a fit run.

use crate::domain::{FitConfig, ModelFit, RadialQuantity, ScaleOutcome};
use crate::profile::{HaloProfiles, MassProfile};

/// Format the full run summary (profile stats + one block per scale estimate).
pub fn format_run_summary(config: &FitConfig, profiles: &HaloProfiles, outcomes: &[ScaleOutcome]) -> String {
    let mut out = String::new();

    out.push_str("=== galscale - disk scale fit ===\n");
    out.push_str(&format!("Snapshot: {}\n", config.snapshot_path.display()));
    out.push_str(&format!("Halo: {} | stars={}\n", profiles.halo, profiles.n_stars));
    out.push_str(&format!(
        "Radial profile: {} | R=[0, {:.2}] kpc | {}\n",
        bin_summary(&profiles.radial),
        config.profile.radial_max,
        quantity_label(config.profile.radial_quantity),
    ));
    out.push_str(&format!(
        "Vertical profile: {} | z=[{:.2}, {:.2}] kpc | R < {:.2} kpc\n",
        bin_summary(&profiles.vertical),
        -config.profile.vertical_max,
        config.profile.vertical_max,
        config.profile.disk_radius,
    ));
    out.push_str(&format!(
        "Scale-length window: ({:.2}, {:.2}) kpc, exclusive\n",
        config.radial_window.0, config.radial_window.1
    ));

    out.push_str("\nEstimates:\n");
    for outcome in outcomes {
        out.push_str(&format_outcome(outcome));
    }

    out
}

/// One estimate: value plus fit diagnostics, or the error that stopped it.
pub fn format_outcome(outcome: &ScaleOutcome) -> String {
    let mut out = String::new();
    match (&outcome.estimate, &outcome.error) {
        (Some(est), _) => {
            out.push_str(&format!(
                "* {:<30} = {:.4} kpc\n",
                outcome.kind.display_name(),
                est.value
            ));
            out.push_str(&format_fit(&est.fit));
        }
        (None, err) => {
            out.push_str(&format!(
                "x {:<30}   failed: {}\n",
                outcome.kind.display_name(),
                err.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    out
}

fn format_fit(fit: &ModelFit) -> String {
    let mut out = String::new();
    out.push_str(&format!("    model : {}\n", fit.model.display_name()));
    out.push_str(&format!(
        "    params: {}\n",
        fmt_params(fit.model.param_names(), &fit.params, fit.std_errors.as_deref())
    ));
    out.push_str(&format!(
        "    SSE={:.4e} RMSE={:.4e} n={} dof={}\n",
        fit.quality.sse, fit.quality.rmse, fit.quality.n, fit.quality.dof
    ));
    if fit.iterations > 0 {
        out.push_str(&format!(
            "    solver: {} iterations ({})\n",
            fit.iterations, fit.termination
        ));
    } else {
        out.push_str(&format!("    solver: {}\n", fit.termination));
    }
    out
}

fn bin_summary(profile: &MassProfile) -> String {
    let occupied = profile.bins.iter().filter(|b| b.count > 0).count();
    format!("bins={} (occupied {occupied})", profile.bins.len())
}

fn quantity_label(q: RadialQuantity) -> &'static str {
    match q {
        RadialQuantity::Mass => "mass per annulus",
        RadialQuantity::SurfaceDensity => "surface density",
    }
}

fn fmt_params(names: &[&str], values: &[f64], errors: Option<&[f64]>) -> String {
    let parts: Vec<String> = names
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (name, v))| match errors.and_then(|e| e.get(i)) {
            Some(se) => format!("{name}={v:.6} ± {se:.2e}"),
            None => format!("{name}={v:.6}"),
        })
        .collect();
    parts.join(", ")
}
