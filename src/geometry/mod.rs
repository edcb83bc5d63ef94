pub mod trimesh;
pub mod voxelizer;

pub use trimesh::TriMesh;
pub use voxelizer::{VoxelGrid, voxelize, voxelize_mesh};
