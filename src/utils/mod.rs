//! Execution helpers shared by the tree builder.

pub mod parallel;

pub use parallel::{parallelism_enabled, set_parallelism, ParallelismGuard};
