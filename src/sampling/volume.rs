use crate::geometry::{TriMesh, VoxelGrid, voxelize_mesh};
use crate::materials::MaterialType;
use crate::math::{Point, Real, Vector};

/// Axis-aligned block of a single material.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxVolume {
    pub min: Point,
    pub size: Vector,
    pub material: MaterialType,
}

impl BoxVolume {
    pub fn new(min: Point, size: Vector, material: MaterialType) -> Self {
        Self {
            min,
            size,
            material,
        }
    }

    pub fn max(&self) -> Point {
        self.min + self.size
    }

    pub fn volume(&self) -> Real {
        self.size.x.max(0.0) * self.size.y.max(0.0) * self.size.z.max(0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max()).all()
    }
}

/// Closed mesh filled with a single material.
///
/// The mesh is voxelized once on construction; its volume is the occupied
/// voxel volume, not the exact enclosed volume.
#[derive(Clone, Debug)]
pub struct MeshVolume {
    mesh: TriMesh,
    material: MaterialType,
    voxels: VoxelGrid,
}

impl MeshVolume {
    /// Voxelizes `mesh` over `resolution³` cells of `cell_size` anchored at the origin.
    pub fn new(mesh: TriMesh, material: MaterialType, resolution: usize, cell_size: Real) -> Self {
        let voxels = voxelize_mesh(&mesh, resolution, cell_size, Point::ZERO);
        Self {
            mesh,
            material,
            voxels,
        }
    }

    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn material(&self) -> MaterialType {
        self.material
    }

    pub fn voxels(&self) -> &VoxelGrid {
        &self.voxels
    }

    pub fn volume(&self) -> Real {
        self.voxels.volume()
    }
}

#[derive(Clone, Debug)]
pub enum VolumeRegion {
    Box(BoxVolume),
    Mesh(MeshVolume),
}

impl VolumeRegion {
    pub fn volume(&self) -> Real {
        match self {
            VolumeRegion::Box(region) => region.volume(),
            VolumeRegion::Mesh(region) => region.volume(),
        }
    }

    pub fn material(&self) -> MaterialType {
        match self {
            VolumeRegion::Box(region) => region.material,
            VolumeRegion::Mesh(region) => region.material,
        }
    }
}

impl From<BoxVolume> for VolumeRegion {
    fn from(region: BoxVolume) -> Self {
        VolumeRegion::Box(region)
    }
}

impl From<MeshVolume> for VolumeRegion {
    fn from(region: MeshVolume) -> Self {
        VolumeRegion::Mesh(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_volume_matches_voxel_count() {
        let mesh = TriMesh::cuboid(Point::new(0.3, 0.3, 0.3), Point::new(0.7, 0.6, 0.7), 1);
        let region = MeshVolume::new(mesh, MaterialType::Jelly, 32, 1.0 / 32.0);
        assert_eq!(region.voxels().inside_count(), 1296);
        assert!((region.volume() - 1296.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn inverted_box_has_no_volume() {
        let region = BoxVolume::new(Point::splat(0.5), Vector::new(0.2, -0.1, 0.2), MaterialType::Water);
        assert_eq!(region.volume(), 0.0);
        assert_eq!(VolumeRegion::from(region).material(), MaterialType::Water);
    }
}
