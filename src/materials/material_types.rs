//! Material types for simulation
//!
//! Materials are a closed set, so dispatch is a flat `match` on the tag rather
//! than a trait object.

use crate::config::constants::{JELLY_HARDENING, SNOW_HARDENING};
use crate::materials::{fluids::water, granular::snow, solids::fixed_corotated};
use crate::math::{Matrix, Real, Svd3, zero_matrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialType {
    Water,
    Jelly,
    Snow,
}

impl MaterialType {
    pub const ALL: [MaterialType; 3] = [Self::Water, Self::Jelly, Self::Snow];

    pub fn is_fluid(&self) -> bool {
        matches!(self, Self::Water)
    }

    pub fn material_name(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Jelly => "jelly",
            Self::Snow => "snow",
        }
    }

    /// Scale applied to both Lamé parameters.
    ///
    /// Snow (and water, whose `Jp` never moves) stiffens as it is compressed;
    /// jelly uses a fixed soft factor.
    #[inline]
    pub fn hardening(&self, plastic_multiplier: Real) -> Real {
        match self {
            Self::Jelly => JELLY_HARDENING,
            Self::Water | Self::Snow => (SNOW_HARDENING * (1.0 - plastic_multiplier)).exp(),
        }
    }
}

/// Result of the per-particle constitutive step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConstitutiveUpdate {
    /// Kirchhoff-like stress `tau` (not yet scaled into a grid force).
    pub stress: Matrix,
    pub deformation_gradient: Matrix,
    pub plastic_multiplier: Real,
}

/// Computes stress and the post-plasticity state for one particle.
///
/// `mu_0` and `lambda_0` are the unhardened Lamé parameters. A deformation
/// gradient the SVD cannot handle (non-finite, non-converging) yields zero
/// stress and leaves the state untouched; the validation pass reports it.
pub fn stress_and_update(
    material: MaterialType,
    deformation_gradient: Matrix,
    plastic_multiplier: Real,
    mu_0: Real,
    lambda_0: Real,
) -> ConstitutiveUpdate {
    let h = material.hardening(plastic_multiplier);
    let mu = if material.is_fluid() { 0.0 } else { mu_0 * h };
    let lambda = lambda_0 * h;

    let Some(svd) = Svd3::decompose(&deformation_gradient) else {
        return ConstitutiveUpdate {
            stress: zero_matrix(),
            deformation_gradient,
            plastic_multiplier,
        };
    };

    let (sigma, plastic_multiplier) = match material {
        MaterialType::Snow => {
            let clamped = snow::clamp_singular_values(svd.sigma);
            (
                clamped,
                plastic_multiplier * snow::plastic_ratio(svd.sigma, clamped),
            )
        }
        MaterialType::Water | MaterialType::Jelly => (svd.sigma, plastic_multiplier),
    };
    let j = sigma.element_product();

    let deformation_gradient = match material {
        MaterialType::Water => water::project_deformation(j),
        MaterialType::Snow => svd.recompose(sigma),
        MaterialType::Jelly => deformation_gradient,
    };

    let stress =
        fixed_corotated::kirchhoff_stress(&deformation_gradient, &svd.rotation(), j, mu, lambda);

    ConstitutiveUpdate {
        stress,
        deformation_gradient,
        plastic_multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vector, identity_matrix};
    use approx::assert_relative_eq;

    const MU_0: Real = 400.0 / 2.4;
    const LAMBDA_0: Real = 400.0 * 0.2 / (1.2 * 0.6);

    fn sheared() -> Matrix {
        Matrix::from_cols(
            Vector::new(1.02, 0.01, 0.0),
            Vector::new(0.03, 0.99, -0.02),
            Vector::new(0.0, 0.015, 1.01),
        )
    }

    #[test]
    fn rest_state_is_stress_free() {
        for material in MaterialType::ALL {
            let update = stress_and_update(material, identity_matrix(), 1.0, MU_0, LAMBDA_0);
            for value in update.stress.to_cols_array() {
                assert_relative_eq!(value, 0.0, epsilon = 1e-4);
            }
            assert_relative_eq!(update.plastic_multiplier, 1.0);
        }
    }

    #[test]
    fn water_keeps_volume_only() {
        let f = sheared();
        let update = stress_and_update(MaterialType::Water, f, 1.0, MU_0, LAMBDA_0);
        let new_f = update.deformation_gradient;

        assert_relative_eq!(new_f.x_axis.x, f.determinant(), epsilon = 1e-5);
        assert_eq!(new_f.y_axis.y, 1.0);
        assert_eq!(new_f.z_axis.z, 1.0);
        assert_eq!(new_f.x_axis.y, 0.0);
        assert_eq!(new_f.x_axis.z, 0.0);
        assert_eq!(new_f.y_axis.x, 0.0);
        assert_eq!(new_f.y_axis.z, 0.0);
        assert_eq!(new_f.z_axis.x, 0.0);
        assert_eq!(new_f.z_axis.y, 0.0);

        // Pressure only: the stress is a multiple of the identity.
        let stress = update.stress;
        assert_relative_eq!(stress.x_axis.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(stress.x_axis.x, stress.y_axis.y, epsilon = 1e-5);
        assert_relative_eq!(stress.y_axis.y, stress.z_axis.z, epsilon = 1e-5);
    }

    #[test]
    fn jelly_accumulates_unclamped() {
        let f = Matrix::from_diagonal(Vector::new(1.3, 0.8, 1.0));
        let update = stress_and_update(MaterialType::Jelly, f, 1.0, MU_0, LAMBDA_0);
        assert_eq!(update.deformation_gradient, f);
        assert_eq!(update.plastic_multiplier, 1.0);
    }

    #[test]
    fn snow_stretch_is_clamped_into_plastic_multiplier() {
        let f = Matrix::from_diagonal(Vector::new(1.1, 1.0, 1.0));
        let update = stress_and_update(MaterialType::Snow, f, 1.0, MU_0, LAMBDA_0);

        let svd = Svd3::decompose(&update.deformation_gradient).unwrap();
        let max_sigma = svd.sigma.max_element();
        assert_relative_eq!(max_sigma, 1.0 + 4.5e-3, epsilon = 1e-5);
        assert_relative_eq!(update.plastic_multiplier, 1.1 / (1.0 + 4.5e-3), epsilon = 1e-5);
    }

    #[test]
    fn snow_hardens_under_compression() {
        let soft = MaterialType::Snow.hardening(1.0);
        let hard = MaterialType::Snow.hardening(0.9);
        assert_relative_eq!(soft, 1.0);
        assert!(hard > soft);
        assert_relative_eq!(MaterialType::Jelly.hardening(0.5), 0.3);
    }

    #[test]
    fn broken_gradient_yields_zero_stress() {
        let mut f = identity_matrix();
        f.x_axis.x = Real::INFINITY;
        let update = stress_and_update(MaterialType::Jelly, f, 1.0, MU_0, LAMBDA_0);
        assert_eq!(update.stress, zero_matrix());
    }
}
