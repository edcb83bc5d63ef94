//! Headless driver: seeds a preset and steps it for a number of frames.
//!
//! Usage: `mpm3d [preset name] [frames]`
//!
//! "Water Mesh" seeds a stand-in box mesh, since no mesh loader is bundled.

use std::time::Instant;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use mpm3d::materials::fluids::water;
use mpm3d::math::{Point, Real};
use mpm3d::scene::WATER_MESH_SCENE;
use mpm3d::{
    MaterialType, MpmPlugin, MpmState, ScenePreset, SceneSelection, SolverParams, TriMesh,
};

const DEFAULT_FRAMES: usize = 120;
const REPORT_EVERY: usize = 20;

fn main() {
    let mut args = std::env::args().skip(1);
    let params = SolverParams::with_grid(32);
    let scene = match args.next() {
        Some(name) if name.trim().eq_ignore_ascii_case(WATER_MESH_SCENE) => {
            let mesh = TriMesh::cuboid(Point::new(-1.0, -0.75, -1.0), Point::new(1.0, 0.75, 1.0), 1);
            SceneSelection::water_mesh(&mesh, &params)
        }
        Some(name) => {
            let preset = ScenePreset::from_name(&name).unwrap_or_else(|| {
                eprintln!("unknown preset '{name}', using {}", ScenePreset::default().name());
                ScenePreset::default()
            });
            SceneSelection::from_preset(preset)
        }
        None => SceneSelection::default(),
    };
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut app = App::new();
    app.add_plugins((
        LogPlugin::default(),
        MpmPlugin::new(params).with_scene(scene),
    ));

    let start = Instant::now();
    for frame in 1..=frames {
        let frame_start = Instant::now();
        app.update();

        if frame % REPORT_EVERY == 0 || frame == frames {
            let Some(state) = app.world().get_resource::<MpmState>() else {
                error!("solver state missing, stopping");
                return;
            };
            let mean_velocity = state.particle_set().mean_velocity();
            let lowest = state
                .particle_set()
                .bounds()
                .map_or(0.0, |(min, _)| min.y);
            info!(
                "frame {}: {:.3}ms, {} particles, mean v ({:.3}, {:.3}, {:.3}), lowest y {:.4}",
                frame,
                frame_start.elapsed().as_secs_f64() * 1000.0,
                state.particle_count(),
                mean_velocity.x,
                mean_velocity.y,
                mean_velocity.z,
                lowest
            );
            if let Some(j) = mean_water_volume_ratio(state) {
                debug!("frame {}: mean water J {:.4}", frame, j);
            }
        }
    }

    info!(
        "{} frames in {:.2}s",
        frames,
        start.elapsed().as_secs_f64()
    );
}

fn mean_water_volume_ratio(state: &MpmState) -> Option<Real> {
    let (sum, count) = state
        .particles()
        .iter()
        .filter(|p| p.material_type == MaterialType::Water)
        .fold((0.0 as Real, 0usize), |(sum, count), p| {
            (sum + water::volume_ratio(&p.deformation_gradient), count + 1)
        });
    (count > 0).then(|| sum / count as Real)
}
