//! Angular-momentum based face-on reorientation.
//!
//! Steps, applied to a halo and propagated to the whole snapshot:
//!
//! 1. position centre: shrinking-sphere centre of mass of the halo
//! 2. velocity centre: mass-weighted mean velocity of the stars within
//!    `vcen_size` of the centre (all members there if too few stars, the
//!    whole halo if too few members)
//! 3. angular momentum of the baryons (stars and gas) within `disk_size`, or
//!    of every member there when the halo has no baryons that close
//! 4. rotate so that the angular momentum points along +z
//!
//! Dark matter is excluded from steps 2 and 3: it outweighs the disk and its
//! net spin is unrelated to the disk plane.
//!
//! The rotation rows are `(up×L̂, L̂×(up×L̂), L̂)` with `up = ŷ` (or `x̂` when
//! `L̂` is parallel to `ŷ`), which keeps the result deterministic.

use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::error::AppError;
use crate::sim::snapshot::{Family, Halo, Particle, Snapshot};

/// Minimum particle count inside the velocity-centre sphere.
const MIN_VCEN_PARTICLES: usize = 5;

#[derive(Debug, Clone)]
pub struct FaceOnOptions {
    /// Radius (kpc) of the region whose angular momentum defines the disk.
    pub disk_size: f64,
    /// Radius (kpc) used for the velocity centre.
    pub vcen_size: f64,
    pub shrink_factor: f64,
    pub min_particles: usize,
}

impl Default for FaceOnOptions {
    fn default() -> Self {
        Self {
            disk_size: 5.0,
            vcen_size: 1.0,
            shrink_factor: 0.7,
            min_particles: 100,
        }
    }
}

/// The transform applied by `face_on`.
#[derive(Debug, Clone)]
pub struct FaceOnTransform {
    pub center: Vector3<f64>,
    pub velocity_center: Vector3<f64>,
    pub angular_momentum: Vector3<f64>,
    pub rotation: Matrix3<f64>,
}

/// One halo member in the snapshot frame.
#[derive(Debug, Clone, Copy)]
pub struct Member {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub mass: f64,
    pub family: Family,
}

impl Member {
    fn is_baryon(&self) -> bool {
        matches!(self.family, Family::Star | Family::Gas)
    }
}

impl From<&Particle> for Member {
    fn from(p: &Particle) -> Self {
        Self {
            pos: Vector3::from(p.pos),
            vel: Vector3::from(p.vel),
            mass: p.mass,
            family: p.family,
        }
    }
}

/// Centre `halo`, rotate its disk face-on, and apply the same transform to
/// every particle of `snapshot`.
pub fn face_on(snapshot: &mut Snapshot, halo: &Halo, opts: &FaceOnOptions) -> Result<FaceOnTransform, AppError> {
    if halo.is_empty() {
        return Err(AppError::domain(format!(
            "Halo {} has no particles; cannot reorient it.",
            halo.number
        )));
    }
    if !(opts.disk_size > 0.0 && opts.vcen_size > 0.0 && opts.shrink_factor > 0.0 && opts.shrink_factor < 1.0) {
        return Err(AppError::input(format!(
            "Invalid face-on options: disk_size={}, vcen_size={}, shrink_factor={}.",
            opts.disk_size, opts.vcen_size, opts.shrink_factor
        )));
    }

    let members: Vec<Member> = halo
        .members
        .iter()
        .map(|&i| Member::from(&snapshot.particles[i]))
        .collect();

    let center = shrink_sphere_center(&members, opts.shrink_factor, opts.min_particles)?;
    let velocity_center = velocity_center(&members, &center, opts.vcen_size)?;
    let angular_momentum = angular_momentum(&members, &center, &velocity_center, opts.disk_size);
    let rotation = faceon_matrix(&angular_momentum)?;
    debug!(
        "face-on: centre={:?} vcen={:?} L={:?}",
        center.as_slice(),
        velocity_center.as_slice(),
        angular_momentum.as_slice()
    );

    for p in &mut snapshot.particles {
        let pos = rotation * (Vector3::from(p.pos) - center);
        let vel = rotation * (Vector3::from(p.vel) - velocity_center);
        p.pos = pos.into();
        p.vel = vel.into();
    }

    Ok(FaceOnTransform {
        center,
        velocity_center,
        angular_momentum,
        rotation,
    })
}

fn center_of_mass<'a>(
    items: impl Iterator<Item = &'a Member>,
    pick: impl Fn(&Member) -> Vector3<f64>,
) -> Option<(Vector3<f64>, usize)> {
    let mut sum = Vector3::zeros();
    let mut mass = 0.0;
    let mut count = 0;
    for item in items {
        sum += pick(item) * item.mass;
        mass += item.mass;
        count += 1;
    }
    if mass > 0.0 && mass.is_finite() {
        Some((sum / mass, count))
    } else {
        None
    }
}

/// Shrinking-sphere centre: repeatedly recentre on the centre of mass inside a
/// sphere that shrinks by `shrink_factor`, until fewer than `min_particles`
/// remain inside.
pub fn shrink_sphere_center(
    members: &[Member],
    shrink_factor: f64,
    min_particles: usize,
) -> Result<Vector3<f64>, AppError> {
    let (mut center, _) = center_of_mass(members.iter(), |m| m.pos)
        .ok_or_else(|| AppError::domain("Halo has no positive mass; cannot find its centre."))?;

    let mut radius = members
        .iter()
        .map(|m| (m.pos - center).norm())
        .fold(0.0_f64, f64::max);

    while radius > 0.0 {
        let inside = members.iter().filter(|m| (m.pos - center).norm() <= radius);
        match center_of_mass(inside, |m| m.pos) {
            Some((c, count)) if count >= min_particles.max(1) => center = c,
            _ => break,
        }
        radius *= shrink_factor;
    }

    Ok(center)
}

/// Mass-weighted mean velocity of the stars within `size` of `center`.
///
/// Falls back to every member within `size`, then to the whole halo, when
/// fewer than `MIN_VCEN_PARTICLES` qualify.
pub fn velocity_center(members: &[Member], center: &Vector3<f64>, size: f64) -> Result<Vector3<f64>, AppError> {
    let near = |m: &&Member| (m.pos - center).norm() <= size;

    let stars = members.iter().filter(near).filter(|m| m.family == Family::Star);
    if let Some((v, count)) = center_of_mass(stars, |m| m.vel) {
        if count >= MIN_VCEN_PARTICLES {
            return Ok(v);
        }
    }
    if let Some((v, count)) = center_of_mass(members.iter().filter(near), |m| m.vel) {
        if count >= MIN_VCEN_PARTICLES {
            return Ok(v);
        }
    }
    center_of_mass(members.iter(), |m| m.vel)
        .map(|(v, _)| v)
        .ok_or_else(|| AppError::domain("Halo has no positive mass; cannot find its velocity centre."))
}

/// Total angular momentum `Σ m (r × v)` of the baryons within `size`, in the
/// centred frame. Every member within `size` counts when no baryon does.
pub fn angular_momentum(
    members: &[Member],
    center: &Vector3<f64>,
    velocity_center: &Vector3<f64>,
    size: f64,
) -> Vector3<f64> {
    let near: Vec<&Member> = members.iter().filter(|m| (m.pos - center).norm() <= size).collect();
    let spin = |m: &Member| (m.pos - center).cross(&(m.vel - velocity_center)) * m.mass;

    if near.iter().any(|m| m.is_baryon()) {
        near.iter().filter(|m| m.is_baryon()).fold(Vector3::zeros(), |acc, m| acc + spin(*m))
    } else {
        near.iter().fold(Vector3::zeros(), |acc, m| acc + spin(*m))
    }
}

/// Rotation taking `angmom` onto +z.
pub fn faceon_matrix(angmom: &Vector3<f64>) -> Result<Matrix3<f64>, AppError> {
    let norm = angmom.norm();
    if !(norm.is_finite() && norm > 0.0) {
        return Err(AppError::domain(
            "Disk angular momentum is zero; the face-on orientation is undefined.",
        ));
    }
    let l_hat = angmom / norm;

    let mut up = Vector3::y();
    if up.cross(&l_hat).norm() < 1e-12 {
        up = Vector3::x();
    }
    let p1 = up.cross(&l_hat).normalize();
    let p2 = l_hat.cross(&p1);

    Ok(Matrix3::from_rows(&[p1.transpose(), p2.transpose(), l_hat.transpose()]))
}
