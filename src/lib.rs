use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod geometry;
pub mod materials;
pub mod math;
pub mod sampling;
pub mod scene;
pub mod solver;

// Public re-exports for clean API
pub use config::{GRAVITY, SolverParams};
pub use crate::core::{Grid, MpmState, Particle, ParticleSet};
pub use error::{MpmError, NumericalInstability, Result};
pub use geometry::{TriMesh, VoxelGrid, voxelize};
pub use materials::MaterialType;
pub use sampling::{BoxVolume, MeshVolume, VolumeRegion, VolumeSampler};
pub use scene::{ColorMode, MaterialPalette, ScenePreset, SceneSelection, SimulationControl};

use crate::core::{reseed_on_scene_change, seed_scene, step_simulation, sync_solver_params};

/// Installs the solver state, scene selection and per-frame stepping.
pub struct MpmPlugin {
    pub params: SolverParams,
    pub scene: SceneSelection,
}

impl MpmPlugin {
    pub fn new(params: SolverParams) -> Self {
        Self {
            params,
            scene: SceneSelection::default(),
        }
    }

    pub fn with_preset(mut self, preset: ScenePreset) -> Self {
        self.scene = SceneSelection::from_preset(preset);
        self
    }

    pub fn with_scene(mut self, scene: SceneSelection) -> Self {
        self.scene = scene;
        self
    }
}

impl Default for MpmPlugin {
    fn default() -> Self {
        Self::new(SolverParams::default())
    }
}

impl Plugin for MpmPlugin {
    fn build(&self, app: &mut App) {
        let state = match MpmState::new(self.params.clone()) {
            Ok(state) => state,
            Err(err) => {
                error!("MpmPlugin not installed: {err}");
                return;
            }
        };

        app.insert_resource(self.params.clone())
            .insert_resource(state)
            .insert_resource(self.scene.clone())
            .init_resource::<SimulationControl>()
            .init_resource::<MaterialPalette>()
            .add_systems(Startup, seed_scene)
            .add_systems(
                Update,
                (sync_solver_params, reseed_on_scene_change, step_simulation).chain(),
            );
    }
}
