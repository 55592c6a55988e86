//! Simulation setup: load a snapshot, convert to physical units, pick the main
//! halo and turn it face-on.
//!
//! The simulation backend is injected through `SimulationSource`, so the setup
//! sequence can run against the bundled JSON loader or a test double.

use std::path::Path;

use log::info;

use crate::error::AppError;

pub mod faceon;
pub mod json;
pub mod snapshot;

pub use faceon::*;
pub use json::*;
pub use snapshot::*;

/// Catalog index of the halo `sim_setup` selects. Halo finders number bound
/// halos from 1 (typically the most massive), so this is not 0.
pub const PRIMARY_HALO_INDEX: usize = 1;

/// The operations `sim_setup` needs from a simulation library.
pub trait SimulationSource {
    type Snapshot;
    type Catalog;
    type Halo;

    fn load(&self, path: &Path) -> Result<Self::Snapshot, AppError>;
    fn physical_units(&self, snapshot: &mut Self::Snapshot) -> Result<(), AppError>;
    fn halos(&self, snapshot: &Self::Snapshot) -> Result<Self::Catalog, AppError>;
    fn select_halo(&self, catalog: &Self::Catalog, index: usize) -> Result<Self::Halo, AppError>;
    fn face_on(&self, snapshot: &mut Self::Snapshot, halo: &Self::Halo) -> Result<(), AppError>;
}

/// Everything `sim_setup` produces, for downstream profile extraction.
pub struct SimSetup<S: SimulationSource> {
    pub snapshot: S::Snapshot,
    pub catalog: S::Catalog,
    pub halo: S::Halo,
}

/// Load `path`, convert to physical units, select halo 1 and reorient it face-on.
pub fn sim_setup<S: SimulationSource>(source: &S, path: &Path) -> Result<SimSetup<S>, AppError> {
    info!("loading sim {}", path.display());
    let mut snapshot = source.load(path)?;

    info!("doing units");
    source.physical_units(&mut snapshot)?;

    info!("selecting halos");
    let catalog = source.halos(&snapshot)?;
    let halo = source.select_halo(&catalog, PRIMARY_HALO_INDEX)?;

    info!("making faceon");
    source.face_on(&mut snapshot, &halo)?;

    Ok(SimSetup {
        snapshot,
        catalog,
        halo,
    })
}
