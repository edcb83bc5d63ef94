//! Materials for MPM simulation
//!
//! Three categories:
//!
//! * `fluids` - Water
//! * `solids` - Fixed-corotated elasticity shared by jelly and snow
//! * `granular` - Snow plasticity

pub mod fluids;
pub mod granular;
pub mod material_types;
pub mod solids;
pub mod utils;

pub use material_types::{ConstitutiveUpdate, MaterialType, stress_and_update};

pub use utils::check;
pub use utils::physics;
