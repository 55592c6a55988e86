//! Export run results.
//!
//! - report JSON: every scale estimate with its fit (schema `domain::ReportFile`)
//! - profile CSV: the binned radial and vertical profiles, one row per bin,
//!   easy to load into a spreadsheet or plotting script

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crate::domain::{ReportFile, ScaleOutcome};
use crate::error::AppError;
use crate::profile::{HaloProfiles, MassProfile};

pub const REPORT_TOOL: &str = "galscale";

/// Assemble the report for one run, stamped with the current time.
pub fn build_report(
    snapshot: &Path,
    profiles: &HaloProfiles,
    radial_window: (f64, f64),
    estimates: &[ScaleOutcome],
) -> ReportFile {
    ReportFile {
        tool: REPORT_TOOL.to_string(),
        generated: Utc::now(),
        snapshot: snapshot.display().to_string(),
        halo: profiles.halo,
        n_stars: profiles.n_stars,
        radial_window: [radial_window.0, radial_window.1],
        estimates: estimates.to_vec(),
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &ReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::io(format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid report JSON: {e}")))
}

/// Write both profiles to a CSV file (`axis` column is `radial` or `vertical`).
pub fn write_profiles_csv(path: &Path, profiles: &HaloProfiles) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create profile CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "axis,lo_kpc,hi_kpc,center_kpc,count,mass_msol,value")
        .map_err(|e| AppError::io(format!("Failed to write profile CSV header: {e}")))?;

    write_rows(&mut out, "radial", &profiles.radial)?;
    write_rows(&mut out, "vertical", &profiles.vertical)?;

    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush profile CSV: {e}")))?;
    Ok(())
}

fn write_rows(out: &mut impl Write, axis: &str, profile: &MassProfile) -> Result<(), AppError> {
    for b in &profile.bins {
        writeln!(
            out,
            "{axis},{:.6},{:.6},{:.6},{},{:.6e},{:.6e}",
            b.lo,
            b.hi,
            b.center(),
            b.count,
            b.mass,
            b.value
        )
        .map_err(|e| AppError::io(format!("Failed to write profile CSV row: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScaleKind;
    use crate::profile::ProfileBin;

    fn profiles() -> HaloProfiles {
        let bin = |lo: f64, hi: f64, count: usize, mass: f64| ProfileBin {
            lo,
            hi,
            count,
            mass,
            value: mass,
        };
        HaloProfiles {
            halo: 1,
            n_stars: 3,
            radial: MassProfile {
                bins: vec![bin(0.0, 1.0, 2, 2.0), bin(1.0, 2.0, 0, 0.0)],
            },
            vertical: MassProfile {
                bins: vec![bin(-0.5, 0.5, 1, 1.0)],
            },
        }
    }

    #[test]
    fn profile_csv_has_one_row_per_bin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        write_profiles_csv(&path, &profiles()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("radial,0.000000,1.000000,0.500000,2,"));
        assert!(lines[3].starts_with("vertical,-0.500000,0.500000,0.000000,1,"));
    }

    #[test]
    fn report_json_keeps_failed_estimates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let outcomes = vec![ScaleOutcome {
            kind: ScaleKind::Length,
            estimate: None,
            error: Some("fitting error: too few points".to_string()),
        }];
        let report = build_report(Path::new("snap.json"), &profiles(), (5.0, 20.0), &outcomes);
        write_report_json(&path, &report).unwrap();

        let back = read_report_json(&path).unwrap();
        assert_eq!(back.tool, REPORT_TOOL);
        assert_eq!(back.halo, 1);
        assert_eq!(back.radial_window, [5.0, 20.0]);
        assert_eq!(back.estimates.len(), 1);
        assert!(back.estimates[0].estimate.is_none());
        assert_eq!(back.generated, report.generated);
    }
}
