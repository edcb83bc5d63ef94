// Physical constants for the 3D scene
use crate::math::Real;

/// Gravitational acceleration along -Y.
pub const GRAVITY: Real = 9.8;

// Elasticity (Young's modulus, Poisson's ratio)
pub const YOUNGS_MODULUS: Real = 400.0;
pub const POISSON_RATIO: Real = 0.2;

pub const PARTICLE_DENSITY: Real = 1.0;

// Hardening
pub const SNOW_HARDENING: Real = 10.0;
pub const JELLY_HARDENING: Real = 0.3;

// Snow plasticity: admissible singular value range
pub const SNOW_CRITICAL_COMPRESSION: Real = 2.5e-2;
pub const SNOW_CRITICAL_STRETCH: Real = 4.5e-3;

// Default display colors (RGB)
pub const WATER_COLOR: [Real; 3] = [0.1, 0.6, 0.9];
pub const JELLY_COLOR: [Real; 3] = [0.93, 0.33, 0.23];
pub const SNOW_COLOR: [Real; 3] = [1.0, 1.0, 1.0];
