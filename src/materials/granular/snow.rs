//! Snow plasticity
//!
//! Singular values of the elastic deformation gradient are projected back
//! into a narrow band; whatever is clipped off becomes plastic deformation.

use crate::config::constants::{SNOW_CRITICAL_COMPRESSION, SNOW_CRITICAL_STRETCH};
use crate::math::{Real, Vector};

pub const MIN_SINGULAR_VALUE: Real = 1.0 - SNOW_CRITICAL_COMPRESSION;
pub const MAX_SINGULAR_VALUE: Real = 1.0 + SNOW_CRITICAL_STRETCH;

#[inline]
pub fn clamp_singular_values(sigma: Vector) -> Vector {
    sigma.clamp(
        Vector::splat(MIN_SINGULAR_VALUE),
        Vector::splat(MAX_SINGULAR_VALUE),
    )
}

/// Product of `sigma / clamped`, the factor folded into `Jp`.
#[inline]
pub fn plastic_ratio(sigma: Vector, clamped: Vector) -> Real {
    (sigma / clamped).element_product()
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_sigma() -> impl Strategy<Value = Vector> {
        (0.05..3.0 as Real, 0.05..3.0 as Real, 0.05..3.0 as Real)
            .prop_map(|(x, y, z)| Vector::new(x, y, z))
    }

    proptest! {
        #[test]
        fn clamping_is_idempotent(sigma in arb_sigma()) {
            let once = clamp_singular_values(sigma);
            prop_assert_eq!(clamp_singular_values(once), once);
        }

        #[test]
        fn clamped_values_stay_in_band(sigma in arb_sigma()) {
            let clamped = clamp_singular_values(sigma);
            prop_assert!(clamped.cmpge(Vector::splat(MIN_SINGULAR_VALUE)).all());
            prop_assert!(clamped.cmple(Vector::splat(MAX_SINGULAR_VALUE)).all());

            // Jp absorbs exactly the volume change that was clipped off.
            let ratio = plastic_ratio(sigma, clamped) * clamped.element_product();
            let volume = sigma.element_product();
            prop_assert!((ratio - volume).abs() <= 1e-4 * volume.max(1.0),
                "{} vs {}", ratio, volume);
        }
    }
}
