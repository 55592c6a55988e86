//! Stellar mass profiles of a face-on halo.
//!
//! Two profiles feed `GalaxyScales`:
//!
//! - radial: star particles binned in cylindrical radius `R = sqrt(x² + y²)`,
//!   reported as mass per annulus or surface density
//! - vertical: stars inside the disk radius binned in `z`, mass per bin
//!
//! Bins with no particles are dropped from the arrays handed to the fitters;
//! the log-space fits cannot use a zero-mass bin.

use crate::domain::{ProfileConfig, RadialQuantity};
use crate::error::AppError;
use crate::math::lin_edges;
use crate::scales::GalaxyScales;
use crate::sim::snapshot::{Family, Halo, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    pub mass: f64,
    /// The quantity fitted for this bin (mass or surface density).
    pub value: f64,
}

impl ProfileBin {
    pub fn center(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MassProfile {
    pub bins: Vec<ProfileBin>,
}

impl MassProfile {
    /// Bin centres and values for bins holding at least one particle.
    pub fn occupied(&self) -> (Vec<f64>, Vec<f64>) {
        self.bins
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| (b.center(), b.value))
            .unzip()
    }

    pub fn total_mass(&self) -> f64 {
        self.bins.iter().map(|b| b.mass).sum()
    }
}

/// Radial and vertical profiles of one halo's stars.
#[derive(Debug, Clone)]
pub struct HaloProfiles {
    pub halo: usize,
    pub n_stars: usize,
    pub radial: MassProfile,
    pub vertical: MassProfile,
}

impl HaloProfiles {
    /// Arrays for `GalaxyScales`, empty bins removed.
    pub fn galaxy_scales(&self) -> Result<GalaxyScales, AppError> {
        let (radius, mass_rad) = self.radial.occupied();
        let (z_dir, mass_z_dir) = self.vertical.occupied();
        GalaxyScales::new(radius, mass_rad, z_dir, mass_z_dir)
    }
}

/// Bin `(x, mass)` samples on `edges`; samples outside the edges are ignored.
pub fn bin_samples(samples: impl Iterator<Item = (f64, f64)>, edges: &[f64]) -> Vec<(usize, f64)> {
    let nbins = edges.len().saturating_sub(1);
    let mut out = vec![(0usize, 0.0f64); nbins];
    if nbins == 0 {
        return out;
    }
    let (lo, hi) = (edges[0], edges[nbins]);
    let width = (hi - lo) / nbins as f64;

    for (x, m) in samples {
        if !(x >= lo && x < hi) {
            continue;
        }
        let idx = (((x - lo) / width) as usize).min(nbins - 1);
        out[idx].0 += 1;
        out[idx].1 += m;
    }
    out
}

/// Radial profile over `[0, config.radial_max)`.
pub fn radial_profile(samples: &[(f64, f64)], config: &ProfileConfig) -> Result<MassProfile, AppError> {
    let edges = lin_edges(0.0, config.radial_max, config.radial_bins)?;
    let binned = bin_samples(samples.iter().copied(), &edges);

    let bins = binned
        .into_iter()
        .enumerate()
        .map(|(i, (count, mass))| {
            let (lo, hi) = (edges[i], edges[i + 1]);
            let value = match config.radial_quantity {
                RadialQuantity::Mass => mass,
                RadialQuantity::SurfaceDensity => mass / (std::f64::consts::PI * (hi * hi - lo * lo)),
            };
            ProfileBin {
                lo,
                hi,
                count,
                mass,
                value,
            }
        })
        .collect();
    Ok(MassProfile { bins })
}

/// Vertical profile over `[-config.vertical_max, config.vertical_max)`.
pub fn vertical_profile(samples: &[(f64, f64)], config: &ProfileConfig) -> Result<MassProfile, AppError> {
    let edges = lin_edges(-config.vertical_max, config.vertical_max, config.vertical_bins)?;
    let binned = bin_samples(samples.iter().copied(), &edges);

    let bins = binned
        .into_iter()
        .enumerate()
        .map(|(i, (count, mass))| ProfileBin {
            lo: edges[i],
            hi: edges[i + 1],
            count,
            mass,
            value: mass,
        })
        .collect();
    Ok(MassProfile { bins })
}

/// Profiles of `halo`'s star particles. Expects a face-on, centred snapshot.
pub fn halo_profiles(snapshot: &Snapshot, halo: &Halo, config: &ProfileConfig) -> Result<HaloProfiles, AppError> {
    let stars: Vec<([f64; 3], f64)> = halo
        .family_members(snapshot, Family::Star)
        .map(|i| (snapshot.particles[i].pos, snapshot.particles[i].mass))
        .collect();
    if stars.is_empty() {
        return Err(AppError::fitting(format!(
            "Halo {} has no star particles to profile.",
            halo.number
        )));
    }

    let cyl_r = |pos: &[f64; 3]| (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();

    let radial_samples: Vec<(f64, f64)> = stars.iter().map(|(pos, m)| (cyl_r(pos), *m)).collect();
    let vertical_samples: Vec<(f64, f64)> = stars
        .iter()
        .filter(|(pos, _)| cyl_r(pos) < config.disk_radius)
        .map(|(pos, m)| (pos[2], *m))
        .collect();

    Ok(HaloProfiles {
        halo: halo.number,
        n_stars: stars.len(),
        radial: radial_profile(&radial_samples, config)?,
        vertical: vertical_profile(&vertical_samples, config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::snapshot::{Particle, Units};
    use approx::assert_relative_eq;

    fn config() -> ProfileConfig {
        ProfileConfig {
            radial_max: 4.0,
            radial_bins: 4,
            radial_quantity: RadialQuantity::Mass,
            vertical_max: 1.0,
            vertical_bins: 2,
            disk_radius: 3.0,
        }
    }

    #[test]
    fn bin_samples_drops_out_of_range_and_clamps_top_edge() {
        let edges = [0.0, 1.0, 2.0];
        let out = bin_samples([(0.5, 1.0), (1.0, 2.0), (1.999, 3.0), (2.0, 4.0), (-0.1, 5.0)].into_iter(), &edges);
        assert_eq!(out, vec![(1, 1.0), (2, 5.0)]);
    }

    #[test]
    fn surface_density_divides_by_annulus_area() {
        let mut cfg = config();
        cfg.radial_quantity = RadialQuantity::SurfaceDensity;
        let p = radial_profile(&[(1.5, 10.0)], &cfg).unwrap();
        let area = std::f64::consts::PI * (4.0 - 1.0);
        assert_relative_eq!(p.bins[1].value, 10.0 / area);
        assert_eq!(p.bins[1].mass, 10.0);
    }

    #[test]
    fn occupied_skips_empty_bins() {
        let p = radial_profile(&[(0.5, 1.0), (2.5, 3.0)], &config()).unwrap();
        let (x, y) = p.occupied();
        assert_eq!(x, vec![0.5, 2.5]);
        assert_eq!(y, vec![1.0, 3.0]);
    }

    #[test]
    fn halo_profiles_use_only_member_stars_inside_disk() {
        let star = |pos: [f64; 3], grp| Particle {
            family: Family::Star,
            pos,
            vel: [0.0; 3],
            mass: 1.0,
            grp,
        };
        let mut particles = vec![
            star([0.5, 0.0, 0.2], 1),
            star([0.0, 2.5, -0.5], 1),
            star([3.5, 0.0, 0.5], 1), // outside disk radius: radial only
            star([1.0, 0.0, 0.1], 2), // other halo
        ];
        particles.push(Particle {
            family: Family::Dm,
            pos: [0.5, 0.5, 0.0],
            vel: [0.0; 3],
            mass: 100.0,
            grp: 1,
        });
        let snap = Snapshot::new(Units::physical(1.0, 1.0), particles);
        let halo = snap.halos().get(1).unwrap().clone();

        let prof = halo_profiles(&snap, &halo, &config()).unwrap();
        assert_eq!(prof.n_stars, 3);
        assert_eq!(prof.radial.total_mass(), 3.0);
        assert_eq!(prof.vertical.total_mass(), 2.0);

        let scales = prof.galaxy_scales().unwrap();
        assert_eq!(scales.radius().len(), 3);
        assert_eq!(scales.z_dir(), &[-0.5, 0.5]);
    }

    #[test]
    fn halo_without_stars_is_rejected() {
        let snap = Snapshot::new(
            Units::physical(1.0, 1.0),
            vec![Particle {
                family: Family::Dm,
                pos: [0.0; 3],
                vel: [0.0; 3],
                mass: 1.0,
                grp: 1,
            }],
        );
        let halo = snap.halos().get(1).unwrap().clone();
        assert!(halo_profiles(&snap, &halo, &config()).is_err());
    }
}
