//! Synthetic disk-galaxy snapshots with known structure.
//!
//! The generated snapshot contains:
//!
//! - halo 1: an exponential stellar disk (surface density `∝ exp(-R/L)`,
//!   vertical density `∝ sech²(z/H)`) on circular orbits, inside a dark halo
//! - halo 2: a small satellite well outside the disk
//! - group 0: a sprinkle of unbound field particles
//!
//! The whole system is tilted and offset at random, then stored in comoving,
//! little-h internal units, so a consumer has to undo every step of
//! `sim_setup` to recover `L` and `H`.

use nalgebra::{Rotation3, Unit, Vector3};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Gamma, Normal};

use crate::error::AppError;
use crate::sim::snapshot::{Family, Particle, Snapshot, Units};

/// Distance (kpc) of the satellite halo from the main disk.
const SATELLITE_DISTANCE: f64 = 80.0;
/// Half-width (kpc) of the cube the field particles are scattered in.
const FIELD_EXTENT: f64 = 300.0;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub stars: usize,
    pub dm: usize,
    pub satellite: usize,
    pub field: usize,
    /// Disk scale length `L` (kpc).
    pub scale_length: f64,
    /// Disk scale height `H` (kpc).
    pub scale_height: f64,
    /// Total stellar mass of the disk (Msol).
    pub disk_mass: f64,
    /// Dark mass as a multiple of the disk mass.
    pub dm_ratio: f64,
    /// Scale radius (kpc) of the dark halo.
    pub dm_scale: f64,
    /// Flat rotation speed (km/s).
    pub v_circ: f64,
    /// Stellar velocity dispersion per component (km/s).
    pub sigma_star: f64,
    pub scale_factor: f64,
    pub hubble: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            stars: 20_000,
            dm: 5_000,
            satellite: 500,
            field: 200,
            scale_length: 3.0,
            scale_height: 0.3,
            disk_mass: 5.0e10,
            dm_ratio: 10.0,
            dm_scale: 15.0,
            v_circ: 200.0,
            sigma_star: 15.0,
            scale_factor: 0.8,
            hubble: 0.7,
            seed: 42,
        }
    }
}

impl SynthConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.stars == 0 {
            return Err(AppError::input("Synthetic galaxy needs at least one star particle."));
        }
        let positive = [
            ("scale_length", self.scale_length),
            ("scale_height", self.scale_height),
            ("disk_mass", self.disk_mass),
            ("dm_scale", self.dm_scale),
            ("scale_factor", self.scale_factor),
            ("hubble", self.hubble),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(AppError::input(format!("{name}={v} must be finite and > 0.")));
            }
        }
        let non_negative = [
            ("dm_ratio", self.dm_ratio),
            ("v_circ", self.v_circ),
            ("sigma_star", self.sigma_star),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AppError::input(format!("{name}={v} must be finite and >= 0.")));
            }
        }
        Ok(())
    }

    /// Internal units of the written snapshot: Mpc/h comoving, 1e10 Msol/h, km/s.
    pub fn units(&self) -> Units {
        Units {
            length_kpc: 1000.0,
            mass_msol: 1.0e10,
            velocity_kms: 1.0,
            scale_factor: self.scale_factor,
            hubble: self.hubble,
            comoving: true,
            little_h: true,
        }
    }
}

fn dist_err(e: impl std::fmt::Display) -> AppError {
    AppError::input(format!("Sampling distribution error: {e}"))
}

/// Uniform direction on the unit sphere.
fn random_direction(rng: &mut StdRng) -> Vector3<f64> {
    let cos_t: f64 = rng.gen_range(-1.0..=1.0);
    let sin_t = (1.0 - cos_t * cos_t).sqrt();
    let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    Vector3::new(sin_t * phi.cos(), sin_t * phi.sin(), cos_t)
}

/// Height drawn from `ρ(z) ∝ sech²(z/H)` by inverting `(1 + tanh(z/H))/2`.
pub fn sample_sech2_height(rng: &mut StdRng, scale_height: f64) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    scale_height * (2.0 * u - 1.0).atanh()
}

/// Disk particles in the galaxy frame (disk in the xy plane, rotating about +z).
fn disk_particles(rng: &mut StdRng, cfg: &SynthConfig) -> Result<Vec<Particle>, AppError> {
    let radius = Gamma::new(2.0, cfg.scale_length).map_err(dist_err)?;
    let dispersion = Normal::new(0.0, cfg.sigma_star).map_err(dist_err)?;
    let mass = cfg.disk_mass / cfg.stars as f64;

    let mut out = Vec::with_capacity(cfg.stars);
    for _ in 0..cfg.stars {
        let r = radius.sample(rng);
        let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let z = sample_sech2_height(rng, cfg.scale_height);
        let (s, c) = phi.sin_cos();
        out.push(Particle {
            family: Family::Star,
            pos: [r * c, r * s, z],
            vel: [
                -cfg.v_circ * s + dispersion.sample(rng),
                cfg.v_circ * c + dispersion.sample(rng),
                dispersion.sample(rng),
            ],
            mass,
            grp: 1,
        });
    }
    Ok(out)
}

/// Dark particles on radial orbits around `center`, so they add no net
/// angular momentum.
fn dark_halo(
    rng: &mut StdRng,
    count: usize,
    total_mass: f64,
    scale: f64,
    center: Vector3<f64>,
    grp: usize,
) -> Result<Vec<Particle>, AppError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let radius = Gamma::new(2.0, scale).map_err(dist_err)?;
    let v_r = Normal::new(0.0, 100.0).map_err(dist_err)?;
    let mass = total_mass / count as f64;

    Ok((0..count)
        .map(|_| {
            let dir = random_direction(rng);
            let pos = center + dir * radius.sample(rng);
            let vel = dir * v_r.sample(rng);
            Particle {
                family: Family::Dm,
                pos: pos.into(),
                vel: vel.into(),
                mass,
                grp,
            }
        })
        .collect())
}

/// Generate a synthetic snapshot in internal units.
pub fn generate_galaxy(cfg: &SynthConfig) -> Result<Snapshot, AppError> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let mut particles = disk_particles(&mut rng, cfg)?;
    particles.extend(dark_halo(
        &mut rng,
        cfg.dm,
        cfg.disk_mass * cfg.dm_ratio,
        cfg.dm_scale,
        Vector3::zeros(),
        1,
    )?);

    // Satellite: a compact dark clump with a few stars, one tenth of the disk mass.
    let sat_center = random_direction(&mut rng) * SATELLITE_DISTANCE;
    let sat_stars = cfg.satellite / 5;
    let sat_mass = 0.1 * cfg.disk_mass;
    particles.extend(dark_halo(&mut rng, cfg.satellite - sat_stars, sat_mass, 2.0, sat_center, 2)?);
    particles.extend(
        dark_halo(&mut rng, sat_stars, 0.1 * sat_mass, 0.5, sat_center, 2)?
            .into_iter()
            .map(|p| Particle {
                family: Family::Star,
                ..p
            }),
    );

    let field_mass = cfg.disk_mass / cfg.stars as f64;
    for _ in 0..cfg.field {
        let pos = [
            rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
            rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
            rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
        ];
        let family = if rng.gen_bool(0.5) { Family::Gas } else { Family::Dm };
        particles.push(Particle {
            family,
            pos,
            vel: [0.0; 3],
            mass: field_mass,
            grp: 0,
        });
    }

    // Random orientation, position and bulk motion for the whole system.
    let axis = Unit::new_normalize(random_direction(&mut rng));
    let tilt = Rotation3::from_axis_angle(&axis, rng.gen_range(0.3..1.2));
    let offset = random_direction(&mut rng) * rng.gen_range(1_000.0..5_000.0);
    let bulk = random_direction(&mut rng) * rng.gen_range(50.0..300.0);

    let units = cfg.units();
    let length = units.length_kpc * units.scale_factor / units.hubble;
    let mass = units.mass_msol / units.hubble;

    for p in &mut particles {
        let pos = tilt * Vector3::from(p.pos) + offset;
        let vel = tilt * Vector3::from(p.vel) + bulk;
        p.pos = (pos / length).into();
        p.vel = (vel / units.velocity_kms).into();
        p.mass /= mass;
    }

    Ok(Snapshot::new(units, particles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sim::faceon::{FaceOnOptions, face_on};

    fn small() -> SynthConfig {
        SynthConfig {
            stars: 4_000,
            dm: 1_000,
            satellite: 100,
            field: 50,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn same_seed_same_snapshot() {
        let a = generate_galaxy(&small()).unwrap();
        let b = generate_galaxy(&small()).unwrap();
        assert_eq!(a, b);

        let c = generate_galaxy(&SynthConfig { seed: 7, ..small() }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn groups_and_families_have_requested_sizes() {
        let snap = generate_galaxy(&small()).unwrap();
        let cat = snap.halos();
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.get(0).unwrap().len(), 50);
        assert_eq!(cat.get(1).unwrap().len(), 5_000);
        assert_eq!(cat.get(2).unwrap().len(), 100);

        let h1 = cat.get(1).unwrap();
        assert_eq!(h1.family_members(&snap, Family::Star).count(), 4_000);
        assert!(!snap.units.is_physical());
    }

    #[test]
    fn disk_mass_survives_unit_round_trip() {
        let cfg = small();
        let mut snap = generate_galaxy(&cfg).unwrap();
        snap.physical_units().unwrap();

        let h1 = snap.halos().get(1).unwrap().clone();
        let stars: f64 = h1
            .family_members(&snap, Family::Star)
            .map(|i| snap.particles[i].mass)
            .sum();
        assert!((stars / cfg.disk_mass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn face_on_disk_has_expected_thickness() {
        let cfg = small();
        let mut snap = generate_galaxy(&cfg).unwrap();
        snap.physical_units().unwrap();
        let halo = snap.halos().get(1).unwrap().clone();
        face_on(&mut snap, &halo, &FaceOnOptions::default()).unwrap();

        let mut abs_z: Vec<f64> = halo
            .family_members(&snap, Family::Star)
            .map(|i| snap.particles[i].pos[2].abs())
            .collect();
        abs_z.sort_by(f64::total_cmp);
        let median = abs_z[abs_z.len() / 2];

        // P(|z| < m) = tanh(m/H) = 1/2 for a sech² layer.
        let expected = cfg.scale_height * 0.5_f64.atanh();
        assert!((median / expected - 1.0).abs() < 0.15, "median |z| = {median}, expected {expected}");
    }

    #[test]
    fn sech2_heights_are_symmetric_and_finite() {
        let mut rng = StdRng::seed_from_u64(3);
        let z: Vec<f64> = (0..10_000).map(|_| sample_sech2_height(&mut rng, 0.5)).collect();
        assert!(z.iter().all(|v| v.is_finite()));
        let mean = z.iter().sum::<f64>() / z.len() as f64;
        assert!(mean.abs() < 0.03, "mean={mean}");
    }

    #[test]
    fn invalid_config_is_input_error() {
        let err = generate_galaxy(&SynthConfig {
            scale_height: 0.0,
            ..small()
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(
            generate_galaxy(&SynthConfig { stars: 0, ..small() }).unwrap_err().kind(),
            ErrorKind::Input
        );
    }
}
