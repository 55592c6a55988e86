//! `SimulationSource` backed by JSON snapshot files (see `io::snapshot`).

use std::path::Path;

use crate::error::AppError;
use crate::io::snapshot::read_snapshot_json;
use crate::sim::SimulationSource;
use crate::sim::faceon::{FaceOnOptions, face_on};
use crate::sim::snapshot::{Halo, HaloCatalog, Snapshot};

#[derive(Debug, Clone, Default)]
pub struct JsonSnapshotSource {
    pub face_on: FaceOnOptions,
}

impl JsonSnapshotSource {
    pub fn new(face_on: FaceOnOptions) -> Self {
        Self { face_on }
    }
}

impl SimulationSource for JsonSnapshotSource {
    type Snapshot = Snapshot;
    type Catalog = HaloCatalog;
    type Halo = Halo;

    fn load(&self, path: &Path) -> Result<Snapshot, AppError> {
        read_snapshot_json(path)
    }

    fn physical_units(&self, snapshot: &mut Snapshot) -> Result<(), AppError> {
        snapshot.physical_units()
    }

    fn halos(&self, snapshot: &Snapshot) -> Result<HaloCatalog, AppError> {
        Ok(snapshot.halos())
    }

    fn select_halo(&self, catalog: &HaloCatalog, index: usize) -> Result<Halo, AppError> {
        catalog.get(index).cloned()
    }

    fn face_on(&self, snapshot: &mut Snapshot, halo: &Halo) -> Result<(), AppError> {
        face_on(snapshot, halo, &self.face_on).map(|_| ())
    }
}
