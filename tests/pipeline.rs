use std::cell::RefCell;
use std::path::{Path, PathBuf};

use galaxy_scales::app::pipeline::run_fit;
use galaxy_scales::data::{SynthConfig, generate_galaxy};
use galaxy_scales::domain::{FitConfig, ProfileConfig, ScaleKind};
use galaxy_scales::error::{AppError, ErrorKind};
use galaxy_scales::io::{build_report, read_report_json, write_profiles_csv, write_report_json, write_snapshot_json};
use galaxy_scales::sim::{JsonSnapshotSource, PRIMARY_HALO_INDEX, SimulationSource, sim_setup};

/// In-memory simulation that records the order of calls.
struct FakeSource {
    catalog: Vec<u32>,
    calls: RefCell<Vec<String>>,
}

impl FakeSource {
    fn with_catalog(catalog: Vec<u32>) -> Self {
        Self {
            catalog,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl SimulationSource for FakeSource {
    type Snapshot = Vec<f64>;
    type Catalog = Vec<u32>;
    type Halo = u32;

    fn load(&self, path: &Path) -> Result<Vec<f64>, AppError> {
        self.record("load");
        if path.ends_with("missing.snap") {
            return Err(AppError::load(format!("no such file: {}", path.display())));
        }
        Ok(vec![1.0, 2.0])
    }

    fn physical_units(&self, snapshot: &mut Vec<f64>) -> Result<(), AppError> {
        self.record("physical_units");
        snapshot.iter_mut().for_each(|v| *v *= 10.0);
        Ok(())
    }

    fn halos(&self, _snapshot: &Vec<f64>) -> Result<Vec<u32>, AppError> {
        self.record("halos");
        Ok(self.catalog.clone())
    }

    fn select_halo(&self, catalog: &Vec<u32>, index: usize) -> Result<u32, AppError> {
        self.record(format!("select_halo({index})"));
        catalog
            .get(index)
            .copied()
            .ok_or_else(|| AppError::index(format!("catalog has {} entries", catalog.len())))
    }

    fn face_on(&self, snapshot: &mut Vec<f64>, halo: &u32) -> Result<(), AppError> {
        self.record(format!("face_on({halo})"));
        snapshot.push(*halo as f64);
        Ok(())
    }
}

#[test]
fn sim_setup_runs_stages_in_order_on_halo_one() {
    let source = FakeSource::with_catalog(vec![100, 101, 102]);
    let setup = sim_setup(&source, Path::new("galaxy.snap")).unwrap();

    assert_eq!(
        *source.calls.borrow(),
        vec!["load", "physical_units", "halos", "select_halo(1)", "face_on(101)"]
    );
    assert_eq!(PRIMARY_HALO_INDEX, 1);
    assert_eq!(setup.halo, 101);
    assert_eq!(setup.catalog.len(), 3);
    // Units were converted before the face-on step saw the snapshot.
    assert_eq!(setup.snapshot, vec![10.0, 20.0, 101.0]);
}

#[test]
fn sim_setup_with_missing_snapshot_is_load_error() {
    let source = FakeSource::with_catalog(vec![0, 1]);
    let err = sim_setup(&source, Path::new("missing.snap")).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert_eq!(*source.calls.borrow(), vec!["load"]);
}

#[test]
fn sim_setup_with_single_entry_catalog_is_index_error() {
    for catalog in [vec![], vec![7]] {
        let source = FakeSource::with_catalog(catalog);
        let err = sim_setup(&source, Path::new("galaxy.snap")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Index);
        assert_eq!(err.exit_code(), 3);
        assert!(!source.calls.borrow().iter().any(|c| c.starts_with("face_on")));
    }
}

#[test]
fn json_source_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = sim_setup(&JsonSnapshotSource::default(), &dir.path().join("nope.json"))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Load);
}

fn fit_config(snapshot: PathBuf) -> FitConfig {
    FitConfig {
        snapshot_path: snapshot,
        radial_window: (5.0, 20.0),
        profile: ProfileConfig::default(),
        disk_size: 5.0,
        max_iterations: 200,
        seed_steps: 60,
        plot: false,
        plot_width: 72,
        plot_height: 18,
        export_report: None,
        export_profiles: None,
    }
}

#[test]
fn synthetic_disk_scales_are_recovered_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let snap_path = dir.path().join("disk.json");

    let truth = SynthConfig {
        scale_length: 3.0,
        scale_height: 0.3,
        seed: 11,
        ..SynthConfig::default()
    };
    write_snapshot_json(&snap_path, &generate_galaxy(&truth).unwrap()).unwrap();

    let config = fit_config(snap_path.clone());
    let run = run_fit(&config).unwrap();
    assert_eq!(run.profiles.halo, 1);
    assert_eq!(run.profiles.n_stars, truth.stars);

    let value = |kind: ScaleKind| {
        run.outcomes
            .iter()
            .find(|o| o.kind == kind)
            .and_then(|o| o.estimate.as_ref())
            .map(|e| e.value)
    };

    let r0 = value(ScaleKind::Length).unwrap();
    assert!((r0 / truth.scale_length - 1.0).abs() < 0.1, "r_0 = {r0}");

    let z_sech2 = value(ScaleKind::HeightSech2).unwrap();
    assert!((z_sech2 / truth.scale_height - 1.0).abs() < 0.1, "z_0 (sech2) = {z_sech2}");

    let z_parab = value(ScaleKind::HeightParabolic).unwrap();
    assert!(z_parab.is_finite() && z_parab > 0.0);

    // Exports of the same run.
    let report_path = dir.path().join("report.json");
    let report = build_report(&snap_path, &run.profiles, config.radial_window, &run.outcomes);
    write_report_json(&report_path, &report).unwrap();
    let back = read_report_json(&report_path).unwrap();
    assert_eq!(back.estimates.len(), 3);
    assert_eq!(back.n_stars, truth.stars);

    let csv_path = dir.path().join("profiles.csv");
    write_profiles_csv(&csv_path, &run.profiles).unwrap();
    let rows = std::fs::read_to_string(&csv_path).unwrap().lines().count();
    assert_eq!(rows, 1 + config.profile.radial_bins + config.profile.vertical_bins);
}
