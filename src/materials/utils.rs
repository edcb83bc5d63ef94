//! Helper functions for materials
//!
//! Math and utility functions that different materials can use.

use crate::math::Real;

/// Exact zero check inverse (prevents NaN from division by zero)
#[inline(always)]
pub fn inv_exact(e: Real) -> Real {
    if e == 0.0 { 0.0 } else { 1.0 / e }
}

/// Physics parameter conversions
pub mod physics {
    use crate::math::Real;

    /// Computes the Lamé parameters (lambda, mu) from Young's modulus and Poisson ratio
    #[inline]
    pub fn lame_lambda_mu(young_modulus: Real, poisson_ratio: Real) -> (Real, Real) {
        let lambda =
            young_modulus * poisson_ratio / ((1.0 + poisson_ratio) * (1.0 - 2.0 * poisson_ratio));
        let mu = shear_modulus(young_modulus, poisson_ratio);
        (lambda, mu)
    }

    /// Shear modulus (mu) from Young's modulus and Poisson ratio
    #[inline]
    pub fn shear_modulus(young_modulus: Real, poisson_ratio: Real) -> Real {
        young_modulus / (2.0 * (1.0 + poisson_ratio))
    }
}

/// Check if material properties make sense
pub mod check {
    use crate::math::Real;

    #[inline]
    pub fn density_ok(density: Real) -> bool {
        density > 0.0 && density < 50000.0 && density.is_finite()
    }

    /// Check if deformation gradient determinant is reasonable
    #[inline]
    pub fn deformation_gradient_ok(det: Real) -> bool {
        det > 0.0 && det.is_finite()
    }

    /// Check if Young's modulus is physically reasonable
    #[inline]
    pub fn young_modulus_ok(e: Real) -> bool {
        e > 0.0 && e < 1e12 && e.is_finite()
    }

    /// Check if Poisson ratio is in valid range
    #[inline]
    pub fn poisson_ratio_ok(nu: Real) -> bool {
        nu > -1.0 && nu < 0.5 && nu.is_finite()
    }
}
