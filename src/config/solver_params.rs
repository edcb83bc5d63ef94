use bevy::prelude::*;

use crate::config::constants::{GRAVITY, PARTICLE_DENSITY, POISSON_RATIO, YOUNGS_MODULUS};
use crate::error::{MpmError, Result};
use crate::materials::utils::{check, physics};
use crate::math::Real;

/// Solver parameters for controlling MPM simulation behavior
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Grid nodes per axis. The domain is the unit cube.
    pub n_grid: usize,

    /// Fixed particle budget for a scene
    pub n_particles: usize,

    /// Substep length in seconds
    pub dt: Real,

    /// Substeps run per visual frame
    pub substeps_per_frame: usize,

    /// Magnitude of gravity along -Y
    pub gravity: Real,

    /// Width (in cells) of the sticky band along every domain face
    pub boundary_width: usize,

    pub youngs_modulus: Real,
    pub poisson_ratio: Real,
    pub particle_density: Real,

    /// Check deformation gradients after every substep and clamp broken particles
    pub validate_numerics: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self::with_grid(64)
    }
}

impl SolverParams {
    /// Defaults scaled to an `n_grid`-sided grid (budget of `n_grid³ / 4` particles).
    pub fn with_grid(n_grid: usize) -> Self {
        Self {
            n_grid,
            n_particles: n_grid.pow(3) / 4,
            dt: 2e-4,
            substeps_per_frame: 25,
            gravity: GRAVITY,
            boundary_width: 3,
            youngs_modulus: YOUNGS_MODULUS,
            poisson_ratio: POISSON_RATIO,
            particle_density: PARTICLE_DENSITY,
            validate_numerics: cfg!(debug_assertions),
        }
    }

    pub fn with_particles(mut self, n_particles: usize) -> Self {
        self.n_particles = n_particles;
        self
    }

    pub fn with_dt(mut self, dt: Real) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_substeps(mut self, substeps_per_frame: usize) -> Self {
        self.substeps_per_frame = substeps_per_frame;
        self
    }

    pub fn with_gravity(mut self, gravity: Real) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_boundary_width(mut self, boundary_width: usize) -> Self {
        self.boundary_width = boundary_width;
        self
    }

    pub fn with_validation(mut self, validate_numerics: bool) -> Self {
        self.validate_numerics = validate_numerics;
        self
    }

    #[inline]
    pub fn cell_size(&self) -> Real {
        1.0 / self.n_grid as Real
    }

    // Matches the reference demo, which sizes particles as (dx / 2)^2.
    #[inline]
    pub fn particle_volume(&self) -> Real {
        (self.cell_size() * 0.5).powi(2)
    }

    #[inline]
    pub fn particle_mass(&self) -> Real {
        self.particle_volume() * self.particle_density
    }

    /// Lamé parameters `(mu_0, lambda_0)` before hardening.
    #[inline]
    pub fn lame_parameters(&self) -> (Real, Real) {
        let (lambda, mu) = physics::lame_lambda_mu(self.youngs_modulus, self.poisson_ratio);
        (mu, lambda)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_grid < 3 {
            return Err(MpmError::InvalidParameter(format!(
                "n_grid must be at least 3, got {}",
                self.n_grid
            )));
        }
        if self.n_particles == 0 {
            return Err(MpmError::InvalidParameter(
                "particle budget must be positive".into(),
            ));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(MpmError::InvalidParameter(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        if !self.gravity.is_finite() {
            return Err(MpmError::InvalidParameter("gravity must be finite".into()));
        }
        if self.boundary_width * 2 > self.n_grid {
            return Err(MpmError::InvalidParameter(format!(
                "boundary width {} covers the whole {}-cell grid",
                self.boundary_width, self.n_grid
            )));
        }
        if !check::young_modulus_ok(self.youngs_modulus) {
            return Err(MpmError::InvalidParameter(format!(
                "unreasonable Young's modulus {}",
                self.youngs_modulus
            )));
        }
        if !check::poisson_ratio_ok(self.poisson_ratio) {
            return Err(MpmError::InvalidParameter(format!(
                "Poisson ratio {} outside (-1, 0.5)",
                self.poisson_ratio
            )));
        }
        if !check::density_ok(self.particle_density) {
            return Err(MpmError::InvalidParameter(format!(
                "unreasonable particle density {}",
                self.particle_density
            )));
        }
        Ok(())
    }
}
