//! In-memory particle snapshot, unit system and halo catalog.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Particle family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Dm,
    Gas,
    Star,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub family: Family,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub mass: f64,
    /// Halo group number; 0 means not bound to any halo.
    #[serde(default)]
    pub grp: usize,
}

/// Conversion factors from the snapshot's internal units to kpc / Msol / km/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub length_kpc: f64,
    pub mass_msol: f64,
    pub velocity_kms: f64,
    /// Cosmological scale factor `a`.
    #[serde(default = "one")]
    pub scale_factor: f64,
    /// Dimensionless Hubble parameter `h`.
    #[serde(default = "one")]
    pub hubble: f64,
    /// Lengths are comoving (multiply by `a`).
    #[serde(default)]
    pub comoving: bool,
    /// Lengths and masses carry a `1/h` factor.
    #[serde(default)]
    pub little_h: bool,
}

fn one() -> f64 {
    1.0
}

impl Units {
    /// Units of a snapshot already in kpc / Msol / km/s.
    pub fn physical(scale_factor: f64, hubble: f64) -> Self {
        Self {
            length_kpc: 1.0,
            mass_msol: 1.0,
            velocity_kms: 1.0,
            scale_factor,
            hubble,
            comoving: false,
            little_h: false,
        }
    }

    pub fn is_physical(&self) -> bool {
        self.length_kpc == 1.0
            && self.mass_msol == 1.0
            && self.velocity_kms == 1.0
            && !self.comoving
            && !self.little_h
    }

    fn length_factor(&self) -> f64 {
        let mut f = self.length_kpc;
        if self.comoving {
            f *= self.scale_factor;
        }
        if self.little_h {
            f /= self.hubble;
        }
        f
    }

    fn mass_factor(&self) -> f64 {
        if self.little_h {
            self.mass_msol / self.hubble
        } else {
            self.mass_msol
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        let factors = [
            ("length_kpc", self.length_kpc),
            ("mass_msol", self.mass_msol),
            ("velocity_kms", self.velocity_kms),
            ("scale_factor", self.scale_factor),
            ("hubble", self.hubble),
        ];
        for (name, v) in factors {
            if !(v.is_finite() && v > 0.0) {
                return Err(AppError::load(format!(
                    "Unit factor {name}={v} must be finite and positive."
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub units: Units,
    pub particles: Vec<Particle>,
}

impl Snapshot {
    pub fn new(units: Units, particles: Vec<Particle>) -> Self {
        Self { units, particles }
    }

    /// Convert positions, velocities and masses to kpc / km/s / Msol in place.
    ///
    /// Calling this on a snapshot that is already physical is a no-op.
    pub fn physical_units(&mut self) -> Result<(), AppError> {
        self.units.validate()?;
        if self.units.is_physical() {
            return Ok(());
        }

        let lf = self.units.length_factor();
        let mf = self.units.mass_factor();
        let vf = self.units.velocity_kms;
        for p in &mut self.particles {
            for k in 0..3 {
                p.pos[k] *= lf;
                p.vel[k] *= vf;
            }
            p.mass *= mf;
        }

        self.units = Units::physical(self.units.scale_factor, self.units.hubble);
        Ok(())
    }

    pub fn total_mass(&self) -> f64 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    /// Build the halo catalog from the particles' group numbers.
    pub fn halos(&self) -> HaloCatalog {
        HaloCatalog::from_groups(self.particles.iter().map(|p| p.grp))
    }
}

/// A halo: its catalog number and the indices of its member particles.
#[derive(Debug, Clone, PartialEq)]
pub struct Halo {
    pub number: usize,
    pub members: Vec<usize>,
}

impl Halo {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member indices restricted to one particle family.
    pub fn family_members<'a>(&'a self, snapshot: &'a Snapshot, family: Family) -> impl Iterator<Item = usize> + 'a {
        self.members
            .iter()
            .copied()
            .filter(move |&i| snapshot.particles[i].family == family)
    }
}

/// Halos indexed by group number. Entry 0 collects unbound (field) particles,
/// so halo 1 is the first bound halo.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HaloCatalog {
    halos: Vec<Halo>,
}

impl HaloCatalog {
    pub fn from_groups(groups: impl Iterator<Item = usize>) -> Self {
        let mut halos: Vec<Halo> = Vec::new();
        for (i, grp) in groups.enumerate() {
            while halos.len() <= grp {
                let number = halos.len();
                halos.push(Halo {
                    number,
                    members: Vec::new(),
                });
            }
            halos[grp].members.push(i);
        }
        Self { halos }
    }

    pub fn len(&self) -> usize {
        self.halos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.halos.is_empty()
    }

    /// Halo at catalog index `index`.
    pub fn get(&self, index: usize) -> Result<&Halo, AppError> {
        self.halos.get(index).ok_or_else(|| {
            AppError::index(format!(
                "Halo catalog has {} entries; there is no halo at index {index}.",
                self.halos.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(family: Family, pos: [f64; 3], mass: f64, grp: usize) -> Particle {
        Particle {
            family,
            pos,
            vel: [1.0, 2.0, 3.0],
            mass,
            grp,
        }
    }

    #[test]
    fn physical_units_applies_cosmology_factors() {
        let units = Units {
            length_kpc: 1000.0,
            mass_msol: 1.0e10,
            velocity_kms: 2.0,
            scale_factor: 0.5,
            hubble: 0.7,
            comoving: true,
            little_h: true,
        };
        let mut snap = Snapshot::new(units, vec![particle(Family::Star, [0.01, 0.0, -0.02], 1.0, 1)]);
        snap.physical_units().unwrap();

        let p = &snap.particles[0];
        let lf = 1000.0 * 0.5 / 0.7;
        assert!((p.pos[0] - 0.01 * lf).abs() < 1e-12);
        assert!((p.pos[2] + 0.02 * lf).abs() < 1e-12);
        assert!((p.vel[1] - 4.0).abs() < 1e-12);
        assert!((p.mass - 1.0e10 / 0.7).abs() < 1e-3);
        assert!(snap.units.is_physical());

        // Second call does nothing.
        let before = snap.clone();
        snap.physical_units().unwrap();
        assert_eq!(before, snap);
    }

    #[test]
    fn physical_units_rejects_bad_factors() {
        let mut units = Units::physical(1.0, 0.7);
        units.length_kpc = 0.0;
        let mut snap = Snapshot::new(units, vec![]);
        let err = snap.physical_units().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Load);
    }

    #[test]
    fn catalog_groups_by_number_with_field_at_zero() {
        let snap = Snapshot::new(
            Units::physical(1.0, 1.0),
            vec![
                particle(Family::Dm, [0.0; 3], 1.0, 1),
                particle(Family::Star, [0.0; 3], 1.0, 0),
                particle(Family::Star, [0.0; 3], 1.0, 2),
                particle(Family::Star, [0.0; 3], 1.0, 1),
            ],
        );
        let cat = snap.halos();
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.get(0).unwrap().members, vec![1]);
        assert_eq!(cat.get(1).unwrap().members, vec![0, 3]);
        assert_eq!(cat.get(2).unwrap().number, 2);

        let h1 = cat.get(1).unwrap();
        let stars: Vec<usize> = h1.family_members(&snap, Family::Star).collect();
        assert_eq!(stars, vec![3]);
    }

    #[test]
    fn catalog_without_bound_halo_has_no_index_one() {
        let snap = Snapshot::new(
            Units::physical(1.0, 1.0),
            vec![particle(Family::Star, [0.0; 3], 1.0, 0)],
        );
        let err = snap.halos().get(1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Index);
    }
}
