pub mod estimate;
pub mod input;
pub mod pack;
