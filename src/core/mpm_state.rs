use bevy::prelude::*;

use crate::config::SolverParams;
use crate::error::{NumericalInstability, Result};
use crate::math::{Real, Vector};
use crate::sampling::{VolumeRegion, VolumeSampler};
use crate::scene::{ColorMode, MaterialPalette, SceneSelection, SimulationControl};
use crate::solver::{grid_to_particle, grid_update, particle_to_grid};

use super::grid::Grid;
use super::particle::Particle;
use super::particle_set::ParticleSet;

/// Aggregate simulation state for the solver.
#[derive(Resource)]
pub struct MpmState {
    particle_set: ParticleSet,
    grid: Grid,
    solver_params: SolverParams,
    substeps: u64,
}

impl MpmState {
    pub fn new(solver_params: SolverParams) -> Result<Self> {
        solver_params.validate()?;
        Ok(Self {
            particle_set: ParticleSet::new(),
            grid: Grid::new(solver_params.n_grid),
            solver_params,
            substeps: 0,
        })
    }

    /// Re-derives the whole particle array from `regions`.
    ///
    /// On error the current particles are left untouched.
    pub fn seed(&mut self, regions: &[VolumeRegion], rng_seed: u64) -> Result<usize> {
        let particles = VolumeSampler::new(self.solver_params.n_particles)
            .with_seed(rng_seed)
            .sample(regions)?;
        let count = particles.len();
        self.particle_set.replace(particles);
        self.substeps = 0;
        Ok(count)
    }

    /// Installs externally built particles (e.g. a restored or hand-made scene).
    pub fn set_particles(&mut self, particles: Vec<Particle>) {
        self.particle_set.replace(particles);
        self.substeps = 0;
    }

    /// One full substep: reset, P2G, grid update, G2P, then validation.
    ///
    /// Each phase is a separate parallel loop, so every phase observes the
    /// completed output of the previous one.
    pub fn substep(&mut self) {
        let params = &self.solver_params;

        self.grid.reset();
        particle_to_grid(params, self.particle_set.particles_mut(), &mut self.grid);
        grid_update(params, &mut self.grid);
        grid_to_particle(params, &self.grid, self.particle_set.particles_mut());

        if params.validate_numerics {
            self.repair_unstable_particles();
        }
        self.substeps += 1;
    }

    /// Runs `substeps_per_frame` substeps.
    pub fn advance_frame(&mut self) {
        for _ in 0..self.solver_params.substeps_per_frame {
            self.substep();
        }
    }

    /// Resets broken particles and logs how many there were.
    ///
    /// Particles with a non-finite position are put back inside the wall band.
    pub fn repair_unstable_particles(&mut self) -> Vec<NumericalInstability> {
        let wall = self.solver_params.boundary_width as Real * self.solver_params.cell_size();
        let reports = self
            .particle_set
            .repair_unstable(Vector::splat(wall), Vector::splat(1.0 - wall));
        if let Some(first) = reports.first() {
            warn!(
                "substep {}: reset {} unstable particle(s), first: {}",
                self.substeps,
                reports.len(),
                first
            );
        }
        reports
    }

    pub fn particle_set(&self) -> &ParticleSet {
        &self.particle_set
    }

    pub fn particles(&self) -> &[Particle] {
        self.particle_set.particles()
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.particle_set.particles_mut()
    }

    pub fn particle_count(&self) -> usize {
        self.particle_set.len()
    }

    pub fn positions(&self) -> Vec<Vector> {
        self.particle_set.positions()
    }

    pub fn colors(&self, mode: ColorMode, palette: &MaterialPalette) -> Vec<Vector> {
        self.particle_set.colors(mode, palette)
    }

    pub fn total_momentum(&self) -> Vector {
        self.particle_set
            .total_momentum(self.solver_params.particle_mass())
    }

    /// Grid state from the last substep. Not meaningful while one is running.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn solver_params(&self) -> &SolverParams {
        &self.solver_params
    }

    /// Swaps solver parameters, rebuilding the grid if its resolution changed.
    pub fn set_solver_params(&mut self, solver_params: SolverParams) -> Result<()> {
        solver_params.validate()?;
        if solver_params.n_grid != self.grid.resolution() {
            self.grid = Grid::new(solver_params.n_grid);
        }
        self.solver_params = solver_params;
        Ok(())
    }

    pub fn gravity(&self) -> Real {
        self.solver_params.gravity
    }

    pub fn set_gravity(&mut self, gravity: Real) {
        self.solver_params.gravity = gravity;
    }

    pub fn substeps(&self) -> u64 {
        self.substeps
    }
}

pub fn seed_scene(mut state: ResMut<MpmState>, selection: Res<SceneSelection>) {
    match state.seed(&selection.regions, selection.seed) {
        Ok(count) => info!("scene '{}' ready with {} particles", selection.name, count),
        Err(err) => error!("failed to seed scene '{}': {}", selection.name, err),
    }
}

/// Re-seeds after a preset switch or restart request. Startup seeding is
/// handled by [`seed_scene`].
pub fn reseed_on_scene_change(
    mut state: ResMut<MpmState>,
    selection: Res<SceneSelection>,
    mut control: ResMut<SimulationControl>,
) {
    if !selection.is_changed() || selection.is_added() {
        return;
    }

    match state.seed(&selection.regions, selection.seed) {
        Ok(count) => {
            info!("reseeded scene '{}' with {} particles", selection.name, count);
            if selection.pause_after_reseed {
                control.paused = true;
            }
        }
        Err(err) => error!("failed to reseed scene '{}': {}", selection.name, err),
    }
}

/// Pushes edits of the `SolverParams` resource into the solver.
pub fn sync_solver_params(mut state: ResMut<MpmState>, params: Res<SolverParams>) {
    if !params.is_changed() || params.is_added() {
        return;
    }
    if let Err(err) = state.set_solver_params(params.clone()) {
        warn!("ignoring solver parameter update: {}", err);
    }
}

pub fn step_simulation(mut state: ResMut<MpmState>, control: Res<SimulationControl>) {
    if control.paused {
        return;
    }
    state.advance_frame();
}
