//! Fixed-corotated elasticity
//!
//! `tau = 2 mu (F - R) F^T + lambda J (J - 1) I`, with `R = U V^T` the
//! rotation from the polar decomposition of `F`.

use crate::math::{Matrix, Real, identity_matrix};

#[inline]
pub fn kirchhoff_stress(
    deformation_gradient: &Matrix,
    rotation: &Matrix,
    j: Real,
    mu: Real,
    lambda: Real,
) -> Matrix {
    (*deformation_gradient - *rotation) * deformation_gradient.transpose() * (2.0 * mu)
        + identity_matrix() * (lambda * j * (j - 1.0))
}
