//! # Core Module
//!
//! Fundamental building blocks shared by the Packmol driver.
//!
//! - **Molecular Representation** ([`models`]) - Atoms and structures with Cartesian coordinates
//! - **File I/O** ([`io`]) - Reading and writing molecular structure files
//! - **Volume Estimation** ([`volume`]) - Atomic radii sets and union-of-spheres volumes

pub mod io;
pub mod models;
pub mod volume;
