//! Material particles for MPM simulation
//!
//! Particles carry kinematic state, the deformation history and a material tag.

use crate::error::NumericalInstability;
use crate::materials::{MaterialType, check};
use crate::math::{
    Matrix, Real, Vector, identity_matrix, matrix_determinant, matrix_is_finite, zero_matrix,
    zero_vector,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    pub affine_momentum_matrix: Matrix, // APIC affine velocity field (C matrix)
    pub deformation_gradient: Matrix,
    /// Hardening state `Jp`; only snow ever moves it away from 1.
    pub plastic_multiplier: Real,
    pub material_type: MaterialType,
    /// Per-particle random display color
    pub color: Vector,
}

impl Particle {
    /// A particle at rest: zero velocity, `F = I`, `Jp = 1`.
    pub fn new(position: Vector, material_type: MaterialType) -> Self {
        Self {
            position,
            velocity: zero_vector(),
            affine_momentum_matrix: zero_matrix(),
            deformation_gradient: identity_matrix(),
            plastic_multiplier: 1.0,
            material_type,
            color: Vector::ONE,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Vector) -> Self {
        self.color = color;
        self
    }

    #[inline(always)]
    pub fn jacobian(&self) -> Real {
        matrix_determinant(&self.deformation_gradient)
    }

    /// Reports a particle whose state can no longer produce meaningful stress.
    pub fn check_health(&self, index: usize) -> Option<NumericalInstability> {
        let determinant = self.jacobian();
        let healthy = matrix_is_finite(&self.deformation_gradient)
            && matrix_is_finite(&self.affine_momentum_matrix)
            && self.position.is_finite()
            && self.velocity.is_finite()
            && self.plastic_multiplier.is_finite()
            && check::deformation_gradient_ok(determinant);

        (!healthy).then_some(NumericalInstability {
            particle: index,
            determinant,
        })
    }

    /// Drops the deformation history so the particle restarts from rest shape.
    pub fn reset_deformation(&mut self) {
        self.deformation_gradient = identity_matrix();
        self.affine_momentum_matrix = zero_matrix();
        self.plastic_multiplier = 1.0;
        if !self.velocity.is_finite() {
            self.velocity = zero_vector();
        }
    }

    /// Pulls a non-finite position back into `[min, max]`.
    ///
    /// Infinite components land on the matching face, NaN components on the
    /// midpoint. Finite positions are left alone.
    pub fn recover_position(&mut self, min: Vector, max: Vector) {
        if self.position.is_finite() {
            return;
        }
        let mid = (min + max) * 0.5;
        let mut recovered = self.position.to_array();
        for (axis, value) in recovered.iter_mut().enumerate() {
            *value = if value.is_nan() {
                mid[axis]
            } else {
                value.clamp(min[axis], max[axis])
            };
        }
        self.position = Vector::from_array(recovered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_is_at_rest() {
        let particle = Particle::new(Vector::splat(0.5), MaterialType::Snow);
        assert_eq!(particle.velocity, Vector::ZERO);
        assert_eq!(particle.deformation_gradient, Matrix::IDENTITY);
        assert_eq!(particle.plastic_multiplier, 1.0);
        assert!(particle.check_health(0).is_none());
    }

    #[test]
    fn inverted_gradient_is_reported_and_recoverable() {
        let mut particle = Particle::new(Vector::splat(0.5), MaterialType::Jelly);
        particle.deformation_gradient = Matrix::from_diagonal(Vector::new(-1.0, 1.0, 1.0));

        let report = particle.check_health(7).unwrap();
        assert_eq!(report.particle, 7);
        assert_eq!(report.determinant, -1.0);

        particle.reset_deformation();
        assert!(particle.check_health(7).is_none());
    }

    #[test]
    fn non_finite_position_is_recovered_into_bounds() {
        let mut particle = Particle::new(
            Vector::new(Real::INFINITY, Real::NAN, Real::NEG_INFINITY),
            MaterialType::Water,
        );
        assert!(particle.check_health(0).is_some());

        particle.reset_deformation();
        particle.recover_position(Vector::splat(0.1), Vector::splat(0.9));
        assert_eq!(particle.position, Vector::new(0.9, 0.5, 0.1));
        assert!(particle.check_health(0).is_none());

        let mut finite = Particle::new(Vector::new(0.5, 0.5, 1e10), MaterialType::Jelly);
        finite.recover_position(Vector::ZERO, Vector::ONE);
        assert_eq!(finite.position.z, 1e10);
    }

    #[test]
    fn non_finite_velocity_is_reported() {
        let particle =
            Particle::new(Vector::splat(0.5), MaterialType::Water).with_velocity(Vector::NAN);
        assert!(particle.check_health(0).is_some());
    }
}
