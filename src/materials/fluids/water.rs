//! Water fluid material
//!
//! Water carries no shear: its deformation gradient is collapsed every step
//! so that only the volume ratio survives.

use crate::math::{Matrix, Real, Vector, diagonal_from_vec};

/// `diag(J, 1, 1)`: identity except for the volumetric term.
#[inline]
pub fn project_deformation(volume_ratio: Real) -> Matrix {
    diagonal_from_vec(Vector::new(volume_ratio, 1.0, 1.0))
}

/// Volume ratio stored in a projected water deformation gradient.
#[inline]
pub fn volume_ratio(deformation_gradient: &Matrix) -> Real {
    deformation_gradient.x_axis.x
}
