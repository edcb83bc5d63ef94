//! Grid-to-Particle (G2P) transfer operations
//!
//! Gathers node velocities back onto particles, rebuilds the APIC affine
//! matrix and advects positions.

use rayon::prelude::*;

use crate::config::SolverParams;
use crate::core::{Grid, GridInterpolation, Particle, kernel::inv_d};
use crate::math::{outer_product, zero_matrix, zero_vector};

/// Phase 3 of the substep. Reads node velocities, so the grid update must be complete.
///
/// Particles outside the lattice are left where they are.
pub fn grid_to_particle(params: &SolverParams, grid: &Grid, particles: &mut [Particle]) {
    let dt = params.dt;
    let cell_size = grid.cell_size();
    let inv_d = inv_d(cell_size);

    particles.par_iter_mut().for_each(|particle| {
        if !grid.contains_point(particle.position) {
            return;
        }
        let interpolation = GridInterpolation::compute_for_particle(particle.position, cell_size);

        let mut velocity = zero_vector();
        let mut affine = zero_matrix();

        for (coord, weight, cell_distance) in interpolation.iter_neighbors() {
            let Some(node) = grid.node(coord) else {
                continue;
            };
            let weighted_velocity = node.velocity() * weight;
            velocity += weighted_velocity;
            affine += outer_product(weighted_velocity, cell_distance) * inv_d;
        }

        particle.velocity = velocity;
        particle.affine_momentum_matrix = affine;
        particle.position += velocity * dt;
    });
}
