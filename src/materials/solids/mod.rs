pub mod fixed_corotated;
