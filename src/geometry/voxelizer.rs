//! Ray-parity voxelization of closed triangle meshes.
//!
//! A ray is cast along +Z through each XY column of cell centers. A cell is
//! inside when the ray has crossed the surface an odd number of times before
//! reaching its center. Open meshes give undefined results, as do cell centers
//! lying exactly on a projected edge.

use bevy::math::{UVec3, Vec2};
use rayon::prelude::*;

use crate::error::{MpmError, Result};
use crate::math::{Point, Real, Vector};

use super::trimesh::TriMesh;

/// Dense occupancy over a cubic block of cells, stored in `x + n*(y + n*z)` order.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    resolution: usize,
    cell_size: Real,
    origin: Point,
    occupied: Vec<bool>,
    inside_count: usize,
}

impl VoxelGrid {
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_size(&self) -> Real {
        self.cell_size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn inside_count(&self) -> usize {
        self.inside_count
    }

    /// Total occupied volume, `inside_count * cell_size³`.
    pub fn volume(&self) -> Real {
        self.inside_count as Real * self.cell_size.powi(3)
    }

    pub fn cell_center(&self, cell: UVec3) -> Point {
        (cell.as_vec3() + Vector::splat(0.5)) * self.cell_size + self.origin
    }

    pub fn is_occupied(&self, cell: UVec3) -> bool {
        let n = self.resolution;
        let (x, y, z) = (cell.x as usize, cell.y as usize, cell.z as usize);
        if x >= n || y >= n || z >= n {
            return false;
        }
        self.occupied[x + n * (y + n * z)]
    }

    /// Occupied cells in scan order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = UVec3> + '_ {
        let n = self.resolution;
        self.occupied
            .iter()
            .enumerate()
            .filter(|(_, inside)| **inside)
            .map(move |(index, _)| {
                UVec3::new(
                    (index % n) as u32,
                    ((index / n) % n) as u32,
                    (index / (n * n)) as u32,
                )
            })
    }
}

/// Triangle projected onto XY with its mean height.
#[derive(Clone, Copy)]
struct ProjectedTriangle {
    a: Vec2,
    b: Vec2,
    c: Vec2,
    mean_z: Real,
}

impl ProjectedTriangle {
    fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            a: a.truncate(),
            b: b.truncate(),
            c: c.truncate(),
            mean_z: (a.z + b.z + c.z) / 3.0,
        }
    }

    /// Either winding counts, so the three edge tests only need to agree.
    fn contains_xy(&self, p: Vec2) -> bool {
        let ab = is_right_of(self.a, self.b, p);
        let bc = is_right_of(self.b, self.c, p);
        let ca = is_right_of(self.c, self.a, p);
        (ab && bc && ca) || (!ab && !bc && !ca)
    }
}

#[inline]
fn is_right_of(a: Vec2, b: Vec2, p: Vec2) -> bool {
    (a - p).perp_dot(b - p) > 0.0
}

/// Voxelizes an indexed triangle soup over `resolution³` cells starting at `origin`.
pub fn voxelize(
    vertices: &[Point],
    indices: &[[u32; 3]],
    resolution: usize,
    cell_size: Real,
    origin: Point,
) -> Result<VoxelGrid> {
    let vertex = |index: u32| {
        vertices
            .get(index as usize)
            .copied()
            .ok_or(MpmError::InvalidMeshIndex {
                index,
                vertex_count: vertices.len(),
            })
    };

    let triangles = indices
        .iter()
        .map(|[a, b, c]| Ok(ProjectedTriangle::new(vertex(*a)?, vertex(*b)?, vertex(*c)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(voxelize_projected(&triangles, resolution, cell_size, origin))
}

pub fn voxelize_mesh(mesh: &TriMesh, resolution: usize, cell_size: Real, origin: Point) -> VoxelGrid {
    let triangles: Vec<_> = mesh
        .triangles()
        .map(|[a, b, c]| ProjectedTriangle::new(a, b, c))
        .collect();
    voxelize_projected(&triangles, resolution, cell_size, origin)
}

fn voxelize_projected(
    triangles: &[ProjectedTriangle],
    resolution: usize,
    cell_size: Real,
    origin: Point,
) -> VoxelGrid {
    let n = resolution;

    // All cells of an XY column share the same set of crossed triangles; only
    // the height filter differs along the column.
    let columns: Vec<Vec<bool>> = (0..n * n)
        .into_par_iter()
        .map(|column| {
            let (x, y) = (column % n, column / n);
            let center_xy = (Vec2::new(x as Real, y as Real) + Vec2::splat(0.5)) * cell_size
                + origin.truncate();

            let crossing_heights: Vec<Real> = triangles
                .iter()
                .filter(|tri| tri.contains_xy(center_xy))
                .map(|tri| tri.mean_z)
                .collect();

            (0..n)
                .map(|z| {
                    let center_z = (z as Real + 0.5) * cell_size + origin.z;
                    let crossings = crossing_heights.iter().filter(|h| center_z > **h).count();
                    crossings % 2 == 1
                })
                .collect()
        })
        .collect();

    let mut occupied = vec![false; n * n * n];
    for (column, cells) in columns.iter().enumerate() {
        for (z, inside) in cells.iter().enumerate() {
            occupied[column + n * n * z] = *inside;
        }
    }
    let inside_count = occupied.iter().filter(|inside| **inside).count();

    VoxelGrid {
        resolution,
        cell_size,
        origin,
        occupied,
        inside_count,
    }
}
