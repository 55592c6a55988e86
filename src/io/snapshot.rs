//! Read/write snapshot JSON files.
//!
//! Snapshot JSON is a plain particle dump:
//! - a `format` tag and schema `version`
//! - the unit block (internal units → kpc / Msol / km/s, cosmology factors)
//! - one record per particle (family, position, velocity, mass, halo group)

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::sim::snapshot::{Particle, Snapshot, Units};

pub const SNAPSHOT_FORMAT: &str = "galscale-snapshot";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub format: String,
    pub version: u32,
    pub units: Units,
    pub particles: Vec<Particle>,
}

/// Read a snapshot JSON file.
pub fn read_snapshot_json(path: &Path) -> Result<Snapshot, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::load(format!("Failed to open snapshot '{}': {e}", path.display())))?;
    let parsed: SnapshotFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::load(format!("Unrecognised snapshot format in '{}': {e}", path.display()))
    })?;

    if parsed.format != SNAPSHOT_FORMAT {
        return Err(AppError::load(format!(
            "'{}' is a '{}' file, expected '{SNAPSHOT_FORMAT}'.",
            path.display(),
            parsed.format
        )));
    }
    if parsed.version != SNAPSHOT_VERSION {
        return Err(AppError::load(format!(
            "Unsupported snapshot version {} in '{}' (expected {SNAPSHOT_VERSION}).",
            parsed.version,
            path.display()
        )));
    }

    // The halo catalog is dense in group number; cap it at one halo per particle.
    let limit = parsed.particles.len();
    if let Some((i, p)) = parsed.particles.iter().enumerate().find(|(_, p)| p.grp > limit) {
        return Err(AppError::load(format!(
            "Particle {i} in '{}' has group number {}, above the particle count {limit}.",
            path.display(),
            p.grp
        )));
    }

    Ok(Snapshot::new(parsed.units, parsed.particles))
}

/// Write a snapshot JSON file.
pub fn write_snapshot_json(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create snapshot '{}': {e}", path.display())))?;

    let out = SnapshotFile {
        format: SNAPSHOT_FORMAT.to_string(),
        version: SNAPSHOT_VERSION,
        units: snapshot.units.clone(),
        particles: snapshot.particles.clone(),
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &out)
        .map_err(|e| AppError::io(format!("Failed to write snapshot JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush snapshot JSON: {e}")))?;

    Ok(())
}
