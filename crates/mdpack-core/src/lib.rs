//! # mdpack Core Library
//!
//! A library for preparing and running Packmol packing jobs: it estimates a packing box
//! from molecular volumes, composes the Packmol control file, and runs the external
//! `packmol` executable with a wall-clock timeout.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that each concern can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless molecular structure models, XYZ file I/O, and
//!   the atomic radii tables and grid-based volume estimator used to size packing boxes.
//!
//! - **[`engine`]: The Packmol Driver.** The `PackRequest` configuration and its builder,
//!   the box estimator, the control-file composer, and the process runner that interprets
//!   Packmol's exit status and in-band error reports.
//!
//! - **[`workflows`]: The Public API.** Ties the `engine` and `core` together into a complete
//!   compose, run and verify packing job.

pub mod core;
pub mod engine;
pub mod workflows;
