use crate::config::SolverParams;
use crate::core::Grid;

/// Grid update stage (divides momentum by mass, applies gravity, clamps boundaries).
pub fn grid_update(params: &SolverParams, grid: &mut Grid) {
    grid.normalize_and_integrate(params.gravity, params.dt, params.boundary_width);
}
