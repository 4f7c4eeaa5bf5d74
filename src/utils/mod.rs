pub mod alloc;
pub mod gauss_fit;
pub mod math;
pub mod running_stats;
pub mod shape_pattern;
pub mod sorting;
