//! Indexed triangle meshes used as seeding volumes.

use crate::error::{MpmError, Result};
use crate::math::{Point, Real, Vector};

#[derive(Clone, Debug, PartialEq)]
pub struct TriMesh {
    vertices: Vec<Point>,
    normals: Option<Vec<Vector>>,
    indices: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Builds a mesh from triangles, checking every index against the vertex buffer.
    pub fn from_triangles(vertices: Vec<Point>, indices: Vec<[u32; 3]>) -> Result<Self> {
        check_indices(indices.iter().flatten().copied(), vertices.len())?;
        Ok(Self {
            vertices,
            normals: None,
            indices,
        })
    }

    /// Builds a mesh from loader-style polygon faces.
    ///
    /// Quads `(a, b, c, d)` are split into `(a, b, c)` and `(a, c, d)`. Any other
    /// face size is rejected.
    pub fn from_polygons(
        vertices: Vec<Point>,
        normals: Option<Vec<Vector>>,
        faces: &[Vec<u32>],
    ) -> Result<Self> {
        let mut indices = Vec::with_capacity(faces.len() * 2);

        for (face, polygon) in faces.iter().enumerate() {
            check_indices(polygon.iter().copied(), vertices.len())?;
            match polygon.as_slice() {
                &[a, b, c] => indices.push([a, b, c]),
                &[a, b, c, d] => {
                    indices.push([a, b, c]);
                    indices.push([a, c, d]);
                }
                _ => {
                    return Err(MpmError::UnsupportedFace {
                        face,
                        vertex_count: polygon.len(),
                    });
                }
            }
        }

        // Normals are only display data; a mismatched buffer is dropped.
        let normals = normals.filter(|n| n.len() == vertices.len());

        Ok(Self {
            vertices,
            normals,
            indices,
        })
    }

    /// A closed axis-aligned box with each face split into `subdivisions²` quads.
    pub fn cuboid(min: Point, max: Point, subdivisions: usize) -> Self {
        let steps = subdivisions.max(1);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for axis in 0..3 {
            let u = (axis + 1) % 3;
            let v = (axis + 2) % 3;

            for high_side in [false, true] {
                let base = vertices.len() as u32;
                let row = (steps + 1) as u32;

                for j in 0..=steps {
                    for i in 0..=steps {
                        let mut p = Point::ZERO;
                        p[axis] = if high_side { max[axis] } else { min[axis] };
                        p[u] = lerp(min[u], max[u], i as Real / steps as Real);
                        p[v] = lerp(min[v], max[v], j as Real / steps as Real);
                        vertices.push(p);
                    }
                }

                for j in 0..steps as u32 {
                    for i in 0..steps as u32 {
                        let p00 = base + j * row + i;
                        let p10 = p00 + 1;
                        let p01 = p00 + row;
                        let p11 = p01 + 1;
                        // Outward winding: u x v points along +axis.
                        let quad = if high_side {
                            [p00, p10, p11, p01]
                        } else {
                            [p00, p01, p11, p10]
                        };
                        indices.push([quad[0], quad[1], quad[2]]);
                        indices.push([quad[0], quad[2], quad[3]]);
                    }
                }
            }
        }

        Self {
            vertices,
            normals: None,
            indices,
        }
    }

    /// Uniformly scales then translates every vertex.
    pub fn transformed(&self, scale: Real, offset: Vector) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v * scale + offset).collect(),
            normals: self.normals.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Rescales the mesh uniformly so its bounding box fits `size` at `origin`.
    pub fn fitted(&self, origin: Point, size: Real) -> Self {
        let Some((min, max)) = self.aabb() else {
            return self.clone();
        };
        let extent = (max - min).max_element();
        if extent <= 0.0 {
            return self.transformed(1.0, origin - min);
        }
        let scale = size / extent;
        self.transformed(scale, origin - min * scale)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn normals(&self) -> Option<&[Vector]> {
        self.normals.as_deref()
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.indices.iter().map(|[a, b, c]| {
            [
                self.vertices[*a as usize],
                self.vertices[*b as usize],
                self.vertices[*c as usize],
            ]
        })
    }

    pub fn aabb(&self) -> Option<(Point, Point)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
        )
    }
}

fn check_indices(indices: impl Iterator<Item = u32>, vertex_count: usize) -> Result<()> {
    for index in indices {
        if index as usize >= vertex_count {
            return Err(MpmError::InvalidMeshIndex {
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

#[inline]
fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}
