//! Background grid for MPM simulation
//!
//! Dense `n³` lattice over the unit cube. Nodes accumulate through atomic
//! float adds so the P2G scatter can run particles in parallel.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::materials::utils;
use crate::math::{GridCoord, Real, Vector, zero_vector};

/// `f32` with lock-free add, stored as its bit pattern.
#[derive(Debug, Default)]
pub struct AtomicReal(AtomicU32);

impl AtomicReal {
    pub fn new(value: Real) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline(always)]
    pub fn load(&self) -> Real {
        Real::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline(always)]
    pub fn store(&self, value: Real) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn fetch_add(&self, value: Real) -> Real {
        let previous = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((Real::from_bits(bits) + value).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        Real::from_bits(previous)
    }
}

/// Holds momentum during P2G and velocity after `normalize_and_integrate`.
#[derive(Debug, Default)]
pub struct GridNode {
    mass: AtomicReal,
    velocity: [AtomicReal; 3],
}

impl GridNode {
    #[inline(always)]
    pub fn mass(&self) -> Real {
        self.mass.load()
    }

    #[inline(always)]
    pub fn velocity(&self) -> Vector {
        Vector::new(
            self.velocity[0].load(),
            self.velocity[1].load(),
            self.velocity[2].load(),
        )
    }

    #[inline(always)]
    fn set_velocity(&self, velocity: Vector) {
        self.velocity[0].store(velocity.x);
        self.velocity[1].store(velocity.y);
        self.velocity[2].store(velocity.z);
    }

    #[inline(always)]
    pub fn accumulate(&self, mass: Real, momentum: Vector) {
        self.mass.fetch_add(mass);
        self.velocity[0].fetch_add(momentum.x);
        self.velocity[1].fetch_add(momentum.y);
        self.velocity[2].fetch_add(momentum.z);
    }

    #[inline(always)]
    pub fn zero(&self) {
        self.mass.store(0.0);
        self.set_velocity(zero_vector());
    }
}

pub struct Grid {
    resolution: usize,
    cell_size: Real,
    nodes: Vec<GridNode>,
}

impl Grid {
    pub fn new(resolution: usize) -> Self {
        let mut nodes = Vec::with_capacity(resolution.pow(3));
        nodes.resize_with(resolution.pow(3), GridNode::default);
        Self {
            resolution,
            cell_size: 1.0 / resolution as Real,
            nodes,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_size(&self) -> Real {
        self.cell_size
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `position` is finite and inside the lattice extent `[0, n·dx)³`.
    #[inline(always)]
    pub fn contains_point(&self, position: Vector) -> bool {
        let extent = Vector::splat(self.resolution as Real * self.cell_size);
        position.is_finite() && position.cmpge(Vector::ZERO).all() && position.cmplt(extent).all()
    }

    #[inline(always)]
    pub fn linear_index(&self, coord: GridCoord) -> Option<usize> {
        let n = self.resolution as i32;
        let inside = coord.x >= 0
            && coord.x < n
            && coord.y >= 0
            && coord.y < n
            && coord.z >= 0
            && coord.z < n;
        inside.then(|| (coord.x + n * (coord.y + n * coord.z)) as usize)
    }

    #[inline(always)]
    pub fn coord_of(&self, index: usize) -> GridCoord {
        let n = self.resolution;
        GridCoord::new(
            (index % n) as i32,
            ((index / n) % n) as i32,
            (index / (n * n)) as i32,
        )
    }

    /// Bounds-checked node lookup.
    #[inline(always)]
    pub fn node(&self, coord: GridCoord) -> Option<&GridNode> {
        self.linear_index(coord).map(|index| &self.nodes[index])
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (GridCoord, &GridNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (self.coord_of(index), node))
    }

    /// Zero every node. Must run before any accumulation in a substep.
    pub fn reset(&mut self) {
        self.nodes.par_iter_mut().for_each(|node| node.zero());
    }

    /// Adds a particle's contribution to a node. Safe to call concurrently.
    ///
    /// Returns `false` when `coord` lies outside the lattice.
    #[inline(always)]
    pub fn accumulate(&self, coord: GridCoord, mass: Real, momentum: Vector) -> bool {
        match self.node(coord) {
            Some(node) => {
                node.accumulate(mass, momentum);
                true
            }
            None => false,
        }
    }

    /// Momentum to velocity, gravity, then sticky walls.
    ///
    /// A velocity component is zeroed when the node sits within
    /// `boundary_width` cells of the low face and points below zero, or within
    /// `boundary_width` of the high face and points above zero.
    pub fn normalize_and_integrate(&mut self, gravity: Real, dt: Real, boundary_width: usize) {
        let n = self.resolution as i32;
        let bound = boundary_width as i32;

        self.nodes
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, node)| {
                let mass = node.mass();
                if mass <= 0.0 {
                    return;
                }

                let mut velocity = node.velocity() * utils::inv_exact(mass);
                velocity.y -= gravity * dt;

                let coord = [
                    (index as i32) % n,
                    ((index as i32) / n) % n,
                    (index as i32) / (n * n),
                ];
                for axis in 0..3 {
                    let i = coord[axis];
                    let v = velocity[axis];
                    if (i < bound && v < 0.0) || (i > n - bound && v > 0.0) {
                        velocity[axis] = 0.0;
                    }
                }

                node.set_velocity(velocity);
            });
    }

    pub fn total_mass(&self) -> Real {
        self.nodes.par_iter().map(|node| node.mass()).sum()
    }

    /// `Σ m·v` over all nodes. Only meaningful after `normalize_and_integrate`.
    pub fn total_momentum(&self) -> Vector {
        self.nodes
            .par_iter()
            .map(|node| node.velocity() * node.mass())
            .reduce(zero_vector, |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn concurrent_accumulation_sums_all_contributions() {
        let grid = Grid::new(4);
        let coord = GridCoord::new(1, 2, 3);

        (0..10_000).into_par_iter().for_each(|_| {
            grid.accumulate(coord, 0.5, Vector::new(1.0, -2.0, 0.25));
        });

        let node = grid.node(coord).unwrap();
        assert_relative_eq!(node.mass(), 5000.0);
        assert_relative_eq!(node.velocity().x, 10_000.0);
        assert_relative_eq!(node.velocity().y, -20_000.0);
        assert_relative_eq!(node.velocity().z, 2500.0);
    }

    #[test]
    fn out_of_range_nodes_are_rejected() {
        let grid = Grid::new(4);
        assert!(!grid.accumulate(GridCoord::new(-1, 0, 0), 1.0, Vector::ONE));
        assert!(!grid.accumulate(GridCoord::new(0, 4, 0), 1.0, Vector::ONE));
        assert_eq!(grid.total_mass(), 0.0);
    }

    #[test]
    fn linear_index_round_trips() {
        let grid = Grid::new(5);
        for index in [0, 7, 31, 124] {
            let coord = grid.coord_of(index);
            assert_eq!(grid.linear_index(coord), Some(index));
        }
    }

    #[test]
    fn reset_clears_every_node() {
        let mut grid = Grid::new(4);
        grid.accumulate(GridCoord::new(2, 2, 2), 1.0, Vector::ONE);
        grid.reset();
        assert!(
            grid.iter_nodes()
                .all(|(_, node)| node.mass() == 0.0 && node.velocity() == Vector::ZERO)
        );
    }

    #[test]
    fn normalize_divides_by_mass_and_applies_gravity() {
        let mut grid = Grid::new(16);
        let coord = GridCoord::new(8, 8, 8);
        grid.accumulate(coord, 2.0, Vector::new(4.0, 2.0, -2.0));
        grid.normalize_and_integrate(10.0, 0.1, 3);

        let velocity = grid.node(coord).unwrap().velocity();
        assert_relative_eq!(velocity.x, 2.0);
        assert_relative_eq!(velocity.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(velocity.z, -1.0);
    }

    #[test]
    fn walls_stop_outward_motion_only() {
        let mut grid = Grid::new(16);
        let floor = GridCoord::new(8, 1, 8);
        let ceiling = GridCoord::new(8, 15, 8);
        let low_x = GridCoord::new(0, 8, 8);
        grid.accumulate(floor, 1.0, Vector::new(1.0, -1.0, 0.0));
        grid.accumulate(ceiling, 1.0, Vector::new(0.0, 5.0, 0.0));
        grid.accumulate(low_x, 1.0, Vector::new(3.0, 0.0, 0.0));
        grid.normalize_and_integrate(0.0, 0.1, 3);

        assert_eq!(grid.node(floor).unwrap().velocity(), Vector::new(1.0, 0.0, 0.0));
        assert_eq!(grid.node(ceiling).unwrap().velocity(), Vector::ZERO);
        // Moving away from the wall is allowed.
        assert_eq!(grid.node(low_x).unwrap().velocity(), Vector::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn points_outside_the_lattice_are_not_contained() {
        let grid = Grid::new(8);
        assert!(grid.contains_point(Vector::splat(0.5)));
        assert!(grid.contains_point(Vector::ZERO));
        assert!(!grid.contains_point(Vector::new(0.5, 0.5, 1e10)));
        assert!(!grid.contains_point(Vector::new(-0.01, 0.5, 0.5)));
        assert!(!grid.contains_point(Vector::new(0.5, 1.0, 0.5)));
        assert!(!grid.contains_point(Vector::new(Real::INFINITY, 0.5, 0.5)));
        assert!(!grid.contains_point(Vector::new(0.5, Real::NAN, 0.5)));
    }

    #[test]
    fn empty_nodes_stay_at_rest() {
        let mut grid = Grid::new(8);
        grid.normalize_and_integrate(9.8, 0.1, 2);
        assert_eq!(grid.total_momentum(), Vector::ZERO);
    }
}
