pub mod sampler;
pub mod volume;

pub use sampler::{VolumeSampler, allocate_budget};
pub use volume::{BoxVolume, MeshVolume, VolumeRegion};
