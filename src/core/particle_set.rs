use rayon::prelude::*;

use crate::core::Particle;
use crate::error::NumericalInstability;
use crate::math::{Real, Vector, zero_vector};
use crate::scene::{ColorMode, MaterialPalette};

/// Fixed-size particle store. Seeding replaces the whole array at once.
#[derive(Clone, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Swaps in a freshly seeded population.
    pub fn replace(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn positions(&self) -> Vec<Vector> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn colors(&self, mode: ColorMode, palette: &MaterialPalette) -> Vec<Vector> {
        self.particles
            .iter()
            .map(|p| match mode {
                ColorMode::Material => palette.color(p.material_type),
                ColorMode::Random => p.color,
            })
            .collect()
    }

    /// `Σ m·v` for a uniform particle mass.
    pub fn total_momentum(&self, particle_mass: Real) -> Vector {
        self.particles
            .par_iter()
            .map(|p| p.velocity * particle_mass)
            .reduce(zero_vector, |a, b| a + b)
    }

    pub fn mean_velocity(&self) -> Vector {
        if self.particles.is_empty() {
            return zero_vector();
        }
        self.total_momentum(1.0) / self.particles.len() as Real
    }

    /// Axis-aligned bounds of all particle positions.
    pub fn bounds(&self) -> Option<(Vector, Vector)> {
        let first = self.particles.first()?.position;
        Some(
            self.particles
                .iter()
                .fold((first, first), |(lo, hi), p| {
                    (lo.min(p.position), hi.max(p.position))
                }),
        )
    }

    /// Finds particles with broken state and resets them to rest shape.
    ///
    /// Non-finite positions are pulled back into `[min, max]`.
    pub fn repair_unstable(&mut self, min: Vector, max: Vector) -> Vec<NumericalInstability> {
        self.particles
            .par_iter_mut()
            .enumerate()
            .filter_map(|(index, particle)| {
                let report = particle.check_health(index)?;
                particle.reset_deformation();
                particle.recover_position(min, max);
                Some(report)
            })
            .collect()
    }
}
