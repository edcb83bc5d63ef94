//! Quadratic B-spline transfer stencil (3x3x3 nodes around a particle).

use crate::math::{GridCoord, Real, Vector};

/// Nodes per axis touched by the kernel
pub const KERNEL_SIZE: usize = 3;
/// Number of neighbors in the 3x3x3 kernel
pub const NEIGHBOR_COUNT: usize = KERNEL_SIZE * KERNEL_SIZE * KERNEL_SIZE;

/// Inverse of the quadratic kernel's inertia tensor, `D⁻¹ = 4 / dx²`.
#[inline]
pub fn inv_d(cell_width: Real) -> Real {
    4.0 / (cell_width * cell_width)
}

/// Per-axis weights for a fractional offset `fx ∈ [0.5, 1.5)` from the base node.
#[inline(always)]
pub fn quadratic_bspline_weights(fx: Vector) -> [Vector; KERNEL_SIZE] {
    let a = Vector::splat(1.5) - fx;
    let b = fx - Vector::ONE;
    let c = fx - Vector::splat(0.5);
    [0.5 * a * a, Vector::splat(0.75) - b * b, 0.5 * c * c]
}

pub struct GridInterpolation {
    pub base_cell: GridCoord,
    /// Particle position relative to `base_cell`, in cells
    pub fx: Vector,
    pub weights: [Vector; KERNEL_SIZE],
    cell_size: Real,
}

impl GridInterpolation {
    #[inline(always)]
    pub fn compute_for_particle(position: Vector, cell_size: Real) -> Self {
        let xp = position / cell_size;
        let base_cell = (xp - Vector::splat(0.5)).floor().as_ivec3();
        let fx = xp - base_cell.as_vec3();

        Self {
            base_cell,
            fx,
            weights: quadratic_bspline_weights(fx),
            cell_size,
        }
    }

    /// Tensor-product weight for the node at `offset` (each component in `0..3`).
    #[inline(always)]
    pub fn weight(&self, offset: [usize; 3]) -> Real {
        self.weights[offset[0]].x * self.weights[offset[1]].y * self.weights[offset[2]].z
    }

    /// `(node, weight, node_position - particle_position)` for all 27 nodes.
    #[inline(always)]
    pub fn iter_neighbors(&self) -> impl Iterator<Item = (GridCoord, Real, Vector)> + '_ {
        (0..NEIGHBOR_COUNT).map(move |idx| {
            let offset = [
                idx % KERNEL_SIZE,
                (idx / KERNEL_SIZE) % KERNEL_SIZE,
                idx / (KERNEL_SIZE * KERNEL_SIZE),
            ];
            let shift = GridCoord::new(offset[0] as i32, offset[1] as i32, offset[2] as i32);
            let distance = (shift.as_vec3() - self.fx) * self.cell_size;
            (self.base_cell + shift, self.weight(offset), distance)
        })
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_position() -> impl Strategy<Value = Vector> {
        (0.05..0.95 as Real, 0.05..0.95 as Real, 0.05..0.95 as Real)
            .prop_map(|(x, y, z)| Vector::new(x, y, z))
    }

    proptest! {
        #[test]
        fn weights_form_partition_of_unity(position in arb_position(), n_grid in 8usize..128) {
            let interpolation =
                GridInterpolation::compute_for_particle(position, 1.0 / n_grid as Real);
            let total: Real = interpolation.iter_neighbors().map(|(_, w, _)| w).sum();
            prop_assert!((total - 1.0).abs() < 1e-5, "weights sum to {}", total);
            prop_assert!(interpolation.iter_neighbors().all(|(_, w, _)| w >= 0.0));
        }

        #[test]
        fn stencil_stays_near_the_particle(position in arb_position(), n_grid in 8usize..128) {
            let cell_size = 1.0 / n_grid as Real;
            let interpolation = GridInterpolation::compute_for_particle(position, cell_size);
            let first_moment = interpolation
                .iter_neighbors()
                .fold(Vector::ZERO, |acc, (_, w, d)| acc + d * w);
            prop_assert!(first_moment.length() < 1e-4 * cell_size);
            for (_, _, distance) in interpolation.iter_neighbors() {
                prop_assert!(distance.abs().max_element() <= 1.5 * cell_size + 1e-6);
            }
        }
    }
}
