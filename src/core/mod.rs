pub mod grid;
pub mod kernel;
pub mod mpm_state;
pub mod particle;
pub mod particle_set;

pub use grid::{AtomicReal, Grid, GridNode};
pub use kernel::{GridInterpolation, KERNEL_SIZE, NEIGHBOR_COUNT, inv_d};
pub use mpm_state::{
    MpmState, reseed_on_scene_change, seed_scene, step_simulation, sync_solver_params,
};
pub use particle::Particle;
pub use particle_set::ParticleSet;
