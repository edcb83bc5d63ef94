//! Particle seeding from volume regions.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::core::Particle;
use crate::error::{MpmError, Result};
use crate::math::{Real, Vector};

use super::volume::{BoxVolume, MeshVolume, VolumeRegion};

/// Splits a particle budget across regions and seeds them.
#[derive(Clone, Debug)]
pub struct VolumeSampler {
    n_particles: usize,
    seed: u64,
}

impl VolumeSampler {
    pub fn new(n_particles: usize) -> Self {
        Self {
            n_particles,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seeds every region in declared order.
    ///
    /// Box regions come out in a reproducible order. Mesh regions reproduce the
    /// same particles per cell, but cell blocks are placed by an atomic counter
    /// so their order in the array follows scheduling.
    pub fn sample(&self, regions: &[VolumeRegion]) -> Result<Vec<Particle>> {
        let volumes: Vec<Real> = regions.iter().map(VolumeRegion::volume).collect();
        let counts = allocate_budget(&volumes, self.n_particles)?;

        let mut particles = Vec::with_capacity(self.n_particles);
        for (index, (region, count)) in regions.iter().zip(&counts).enumerate() {
            debug!(
                "region {} ({}): volume {:.5}, {} particles",
                index,
                region.material().material_name(),
                volumes[index],
                count
            );
            match region {
                VolumeRegion::Box(block) => {
                    particles.extend(self.sample_box(index, block, *count));
                }
                VolumeRegion::Mesh(mesh) => {
                    particles.extend(self.sample_mesh(index, mesh, *count));
                }
            }
        }

        info!(
            "seeded {} particles from {} region(s), total volume {:.5}",
            particles.len(),
            regions.len(),
            volumes.iter().filter(|v| **v > 0.0).sum::<Real>()
        );
        Ok(particles)
    }

    fn sample_box(&self, region_index: usize, block: &BoxVolume, count: usize) -> Vec<Particle> {
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, region_index, u64::MAX));
        (0..count)
            .map(|_| {
                let position = block.min + random_vector(&mut rng) * block.size;
                Particle::new(position, block.material).with_color(random_vector(&mut rng))
            })
            .collect()
    }

    fn sample_mesh(&self, region_index: usize, region: &MeshVolume, count: usize) -> Vec<Particle> {
        let voxels = region.voxels();
        let cells: Vec<_> = voxels.occupied_cells().collect();

        if cells.is_empty() {
            warn!(
                "mesh region {} has no occupied voxels; is the mesh closed and inside the grid?",
                region_index
            );
            return Vec::new();
        }

        let per_cell = count / cells.len();
        let leftover = count % cells.len();
        let cell_size = voxels.cell_size();
        let next_index = AtomicUsize::new(0);

        let mut blocks: Vec<(usize, Vec<Particle>)> = cells
            .par_iter()
            .enumerate()
            .map(|(scan_index, cell)| {
                let here = per_cell + usize::from(scan_index < leftover);
                let start = next_index.fetch_add(here, Ordering::Relaxed);

                let mut rng =
                    StdRng::seed_from_u64(mix_seed(self.seed, region_index, scan_index as u64));
                let center = voxels.cell_center(*cell);
                let block = (0..here)
                    .map(|_| {
                        let jitter = (random_vector(&mut rng) - Vector::splat(0.5)) * cell_size;
                        Particle::new(center + jitter, region.material())
                            .with_color(random_vector(&mut rng))
                    })
                    .collect();
                (start, block)
            })
            .collect();

        blocks.sort_unstable_by_key(|(start, _)| *start);
        blocks.into_iter().flat_map(|(_, block)| block).collect()
    }
}

/// Proportional split of `n_particles` by region volume.
///
/// Each region with positive volume gets `floor(v / total * n)`; the last
/// such region takes whatever is left so the counts always sum to `n`.
/// Regions with no volume get nothing.
pub fn allocate_budget(volumes: &[Real], n_particles: usize) -> Result<Vec<usize>> {
    let total_volume: Real = volumes.iter().filter(|v| **v > 0.0).sum();
    if !(total_volume > 0.0) || !total_volume.is_finite() {
        return Err(MpmError::DegenerateScene { total_volume });
    }

    let last = volumes.iter().rposition(|v| *v > 0.0);
    let mut allocated = 0;

    let counts = volumes
        .iter()
        .enumerate()
        .map(|(index, volume)| {
            let count = if *volume <= 0.0 {
                0
            } else if Some(index) == last {
                n_particles - allocated
            } else {
                let share = (volume / total_volume * n_particles as Real).floor() as usize;
                share.min(n_particles - allocated)
            };
            allocated += count;
            count
        })
        .collect();

    Ok(counts)
}

fn random_vector(rng: &mut impl Rng) -> Vector {
    Vector::new(rng.random(), rng.random(), rng.random())
}

fn mix_seed(seed: u64, region: usize, stream: u64) -> u64 {
    let mut x = seed ^ (region as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    x ^= stream.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 31;
    x.wrapping_mul(0x94d0_49bb_1331_11eb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TriMesh;
    use crate::materials::MaterialType;
    use crate::math::Point;

    #[test]
    fn budget_matches_known_splits() {
        let counts = allocate_budget(&[0.064, 0.027, 0.008], 1000).unwrap();
        assert_eq!(counts, vec![646, 272, 82]);

        let counts = allocate_budget(&[0.3, 0.0, 0.1, 0.2, 0.0], 7).unwrap();
        assert_eq!(counts, vec![3, 0, 1, 3, 0]);
    }

    #[test]
    fn empty_scene_is_degenerate() {
        assert_eq!(
            allocate_budget(&[], 10),
            Err(MpmError::DegenerateScene { total_volume: 0.0 })
        );
        assert!(allocate_budget(&[0.0, -1.0], 10).is_err());
    }

    #[test]
    fn box_particles_start_at_rest_inside() {
        let block = BoxVolume::new(Point::splat(0.05), Vector::splat(0.4), MaterialType::Snow);
        let particles = VolumeSampler::new(500)
            .with_seed(3)
            .sample(&[block.clone().into()])
            .unwrap();

        assert_eq!(particles.len(), 500);
        for p in &particles {
            assert!(block.contains(p.position));
            assert_eq!(p.velocity, Vector::ZERO);
            assert_eq!(p.plastic_multiplier, 1.0);
            assert_eq!(p.material_type, MaterialType::Snow);
        }
    }

    #[test]
    fn same_seed_same_box_particles() {
        let region: VolumeRegion =
            BoxVolume::new(Point::splat(0.2), Vector::splat(0.3), MaterialType::Water).into();
        let a = VolumeSampler::new(64).with_seed(11).sample(&[region.clone()]).unwrap();
        let b = VolumeSampler::new(64).with_seed(11).sample(&[region]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mesh_particles_fill_occupied_cells() {
        let mesh = TriMesh::cuboid(Point::new(0.3, 0.3, 0.3), Point::new(0.7, 0.6, 0.7), 1);
        let region = MeshVolume::new(mesh, MaterialType::Jelly, 32, 1.0 / 32.0);
        let cells = region.voxels().inside_count();
        let budget = cells * 2 + 5;

        let particles = VolumeSampler::new(budget)
            .with_seed(5)
            .sample(&[region.clone().into()])
            .unwrap();
        assert_eq!(particles.len(), budget);

        let half = 0.5 / 32.0 + 1e-6;
        for p in &particles {
            assert!(p.position.cmpgt(Vector::splat(0.3 - half)).all());
            assert!(p.position.cmplt(Vector::new(0.7, 0.6, 0.7) + half).all());
            assert_eq!(p.material_type, MaterialType::Jelly);
        }
    }

    #[test]
    fn mesh_cells_own_contiguous_disjoint_ranges() {
        let mesh = TriMesh::cuboid(Point::new(0.3, 0.3, 0.3), Point::new(0.7, 0.6, 0.7), 1);
        let region = MeshVolume::new(mesh, MaterialType::Water, 32, 1.0 / 32.0);
        let cells = region.voxels().inside_count();
        let leftover = 7;
        let particles = VolumeSampler::new(cells * 3 + leftover)
            .with_seed(9)
            .sample(&[region.into()])
            .unwrap();

        // Jitter stays within half a cell of the center.
        let cell_of = |p: &Particle| (p.position * 32.0 - Vector::splat(0.5)).round().as_ivec3();
        let mut runs: Vec<(bevy::math::IVec3, usize)> = Vec::new();
        for p in &particles {
            match runs.last_mut() {
                Some((cell, len)) if *cell == cell_of(p) => *len += 1,
                _ => runs.push((cell_of(p), 1)),
            }
        }

        assert_eq!(runs.len(), cells);
        let mut owners: Vec<_> = runs.iter().map(|(cell, _)| cell.to_array()).collect();
        owners.sort_unstable();
        owners.dedup();
        assert_eq!(owners.len(), cells, "a cell's particles were split across ranges");
        assert_eq!(runs.iter().filter(|(_, len)| *len == 4).count(), leftover);
        assert!(runs.iter().all(|(_, len)| *len == 3 || *len == 4));
    }

    #[test]
    fn empty_mesh_contributes_nothing() {
        // A box thinner than a cell never covers a cell center.
        let sliver = TriMesh::cuboid(Point::new(0.3, 0.3, 0.3), Point::new(0.7, 0.31, 0.7), 1);
        let empty = MeshVolume::new(sliver, MaterialType::Water, 16, 1.0 / 16.0);
        assert_eq!(empty.voxels().inside_count(), 0);

        let block = BoxVolume::new(Point::splat(0.1), Vector::splat(0.2), MaterialType::Jelly);
        let particles = VolumeSampler::new(100)
            .sample(&[block.into(), empty.into()])
            .unwrap();
        assert_eq!(particles.len(), 100);
    }
}
