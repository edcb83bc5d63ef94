//! Named scene presets, scene selection and display colors.

use bevy::prelude::*;

use crate::config::{JELLY_COLOR, SNOW_COLOR, SolverParams, WATER_COLOR};
use crate::geometry::TriMesh;
use crate::materials::MaterialType;
use crate::math::{Point, Real, Vector};
use crate::sampling::{BoxVolume, MeshVolume, VolumeRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScenePreset {
    #[default]
    SingleDamBreak,
    DoubleDamBreak,
    WaterSnowJelly,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [
        ScenePreset::SingleDamBreak,
        ScenePreset::DoubleDamBreak,
        ScenePreset::WaterSnowJelly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenePreset::SingleDamBreak => "Single Dam Break",
            ScenePreset::DoubleDamBreak => "Double Dam Break",
            ScenePreset::WaterSnowJelly => "Water Snow Jelly",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn regions(&self) -> Vec<VolumeRegion> {
        let block = |min: [Real; 3], size: [Real; 3], material| {
            VolumeRegion::Box(BoxVolume::new(
                Point::from_array(min),
                Vector::from_array(size),
                material,
            ))
        };

        match self {
            ScenePreset::SingleDamBreak => vec![block(
                [0.55, 0.05, 0.55],
                [0.4, 0.4, 0.4],
                MaterialType::Water,
            )],
            ScenePreset::DoubleDamBreak => vec![
                block([0.05, 0.05, 0.05], [0.3, 0.4, 0.3], MaterialType::Water),
                block([0.65, 0.05, 0.65], [0.3, 0.4, 0.3], MaterialType::Water),
            ],
            ScenePreset::WaterSnowJelly => vec![
                block([0.6, 0.05, 0.6], [0.25, 0.25, 0.25], MaterialType::Water),
                block([0.35, 0.35, 0.35], [0.25, 0.25, 0.25], MaterialType::Snow),
                block([0.05, 0.6, 0.05], [0.25, 0.25, 0.25], MaterialType::Jelly),
            ],
        }
    }
}

/// Display name of the mesh scene built by [`SceneSelection::water_mesh`].
pub const WATER_MESH_SCENE: &str = "Water Mesh";

/// A caller-supplied mesh dropped into the tank as a single water volume.
///
/// The mesh is fitted into a `0.4` cube resting on the floor and voxelized at
/// the solver grid resolution.
pub fn water_mesh_regions(mesh: &TriMesh, params: &SolverParams) -> Vec<VolumeRegion> {
    let fitted = mesh.fitted(Point::new(0.3, 0.05, 0.3), 0.4);
    vec![VolumeRegion::Mesh(MeshVolume::new(
        fitted,
        MaterialType::Water,
        params.n_grid,
        params.cell_size(),
    ))]
}

/// The scene currently seeded into the solver.
///
/// Mutating this resource (switching presets or calling [`SceneSelection::restart`])
/// makes the plugin re-seed on the next update.
#[derive(Resource, Debug, Clone)]
pub struct SceneSelection {
    pub name: String,
    pub regions: Vec<VolumeRegion>,
    pub seed: u64,
    pub pause_after_reseed: bool,
}

impl SceneSelection {
    pub fn from_preset(preset: ScenePreset) -> Self {
        Self::custom(preset.name(), preset.regions())
    }

    pub fn custom(name: impl Into<String>, regions: Vec<VolumeRegion>) -> Self {
        Self {
            name: name.into(),
            regions,
            seed: 0,
            pause_after_reseed: false,
        }
    }

    /// The "Water Mesh" scene: `mesh` fitted into the tank as water.
    pub fn water_mesh(mesh: &TriMesh, params: &SolverParams) -> Self {
        Self::custom(WATER_MESH_SCENE, water_mesh_regions(mesh, params))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Switches presets; the simulation pauses once the new scene is seeded.
    pub fn select_preset(&mut self, preset: ScenePreset) {
        self.name = preset.name().to_string();
        self.regions = preset.regions();
        self.pause_after_reseed = true;
    }

    /// Re-seeds the current scene without pausing.
    pub fn restart(&mut self) {
        self.pause_after_reseed = false;
    }
}

impl Default for SceneSelection {
    fn default() -> Self {
        Self::from_preset(ScenePreset::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Material,
    Random,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimulationControl {
    pub paused: bool,
    pub color_mode: ColorMode,
}

impl SimulationControl {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

/// Per-material display colors.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct MaterialPalette {
    pub water: Vector,
    pub jelly: Vector,
    pub snow: Vector,
}

impl MaterialPalette {
    pub fn color(&self, material: MaterialType) -> Vector {
        match material {
            MaterialType::Water => self.water,
            MaterialType::Jelly => self.jelly,
            MaterialType::Snow => self.snow,
        }
    }
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            water: Vector::from_array(WATER_COLOR),
            jelly: Vector::from_array(JELLY_COLOR),
            snow: Vector::from_array(SNOW_COLOR),
        }
    }
}
