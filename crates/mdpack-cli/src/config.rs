mod builder;
mod file;

pub use builder::{JobConfig, build_job};
