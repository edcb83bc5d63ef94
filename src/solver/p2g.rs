//! Particle-to-Grid (P2G) transfer operations
//!
//! Updates each particle's deformation gradient, runs the material law and
//! scatters mass, momentum and stress-driven momentum flux onto the grid.

use rayon::prelude::*;

use crate::config::SolverParams;
use crate::core::{Grid, GridInterpolation, Particle, kernel::inv_d};
use crate::materials::stress_and_update;
use crate::math::identity_matrix;

/// Phase 1 of the substep. The grid must have been reset beforehand.
///
/// Contributions to shared nodes go through atomic adds, so particles run in
/// parallel; nodes outside the lattice are dropped. Particles that have left
/// the lattice (or gone non-finite) are skipped and keep their state.
pub fn particle_to_grid(params: &SolverParams, particles: &mut [Particle], grid: &mut Grid) {
    let grid = &*grid;
    let dt = params.dt;
    let cell_size = grid.cell_size();
    let particle_mass = params.particle_mass();
    let (mu_0, lambda_0) = params.lame_parameters();
    // Kirchhoff stress to momentum flux: -dt * V_p * 4 / dx²
    let stress_scale = -dt * params.particle_volume() * inv_d(cell_size);

    particles.par_iter_mut().for_each(|particle| {
        if !grid.contains_point(particle.position) {
            return;
        }
        let interpolation = GridInterpolation::compute_for_particle(particle.position, cell_size);

        // F_new = (I + dt * C) * F_old
        particle.deformation_gradient = (identity_matrix() + particle.affine_momentum_matrix * dt)
            * particle.deformation_gradient;

        let update = stress_and_update(
            particle.material_type,
            particle.deformation_gradient,
            particle.plastic_multiplier,
            mu_0,
            lambda_0,
        );
        particle.deformation_gradient = update.deformation_gradient;
        particle.plastic_multiplier = update.plastic_multiplier;

        let affine = update.stress * stress_scale + particle.affine_momentum_matrix * particle_mass;
        let momentum = particle.velocity * particle_mass;

        for (coord, weight, cell_distance) in interpolation.iter_neighbors() {
            grid.accumulate(
                coord,
                weight * particle_mass,
                (momentum + affine * cell_distance) * weight,
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialType;
    use crate::math::{Matrix, Real, Vector};
    use approx::assert_relative_eq;

    #[test]
    fn scatter_conserves_mass_and_momentum() {
        let params = SolverParams::with_grid(16);
        let mut grid = Grid::new(params.n_grid);
        let mut particles = vec![
            Particle::new(Vector::new(0.41, 0.52, 0.37), MaterialType::Jelly)
                .with_velocity(Vector::new(0.3, -0.1, 0.2)),
            Particle::new(Vector::new(0.43, 0.5, 0.4), MaterialType::Water)
                .with_velocity(Vector::new(-0.2, 0.4, 0.0)),
        ];
        particles[0].affine_momentum_matrix = Matrix::from_cols(
            Vector::new(0.5, 0.1, 0.0),
            Vector::new(-0.2, 0.3, 0.1),
            Vector::new(0.0, 0.2, -0.4),
        );

        particle_to_grid(&params, &mut particles, &mut grid);

        let mass = params.particle_mass();
        assert_relative_eq!(grid.total_mass(), 2.0 * mass, max_relative = 1e-4);

        // Raw momentum lives in the node velocity slot until normalization.
        let scattered = grid
            .iter_nodes()
            .fold(Vector::ZERO, |acc, (_, node)| acc + node.velocity());
        let expected = (particles[0].velocity + particles[1].velocity) * mass;
        assert_relative_eq!(scattered.x, expected.x, epsilon = 1e-7);
        assert_relative_eq!(scattered.y, expected.y, epsilon = 1e-7);
        assert_relative_eq!(scattered.z, expected.z, epsilon = 1e-7);
    }

    #[test]
    fn water_never_accumulates_shear() {
        let params = SolverParams::with_grid(16);
        let mut grid = Grid::new(params.n_grid);
        let mut particle = Particle::new(Vector::splat(0.5), MaterialType::Water);
        particle.affine_momentum_matrix = Matrix::from_cols(
            Vector::new(0.2, 1.5, -0.7),
            Vector::new(0.9, -0.1, 0.4),
            Vector::new(-1.2, 0.6, 0.3),
        );
        let mut particles = vec![particle];

        for _ in 0..3 {
            particle_to_grid(&params, &mut particles, &mut grid);
        }

        let f = particles[0].deformation_gradient;
        let off_diagonal: [Real; 6] = [
            f.x_axis.y, f.x_axis.z, f.y_axis.x, f.y_axis.z, f.z_axis.x, f.z_axis.y,
        ];
        assert!(off_diagonal.iter().all(|&v| v == 0.0));
        assert_eq!(f.y_axis.y, 1.0);
        assert_eq!(f.z_axis.z, 1.0);
    }
}
