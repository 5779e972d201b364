//! # Engine Module
//!
//! Drives the external Packmol executable.
//!
//! ## Overview
//!
//! A packing job is described by a [`config::PackRequest`]. The engine turns that request
//! into a Packmol control file and runs Packmol against it:
//!
//! - **Configuration** ([`config`]) - The request, its builder, and pass-through control options
//! - **Box Estimation** ([`estimator`]) - Cubic box sizing from summed molecular volumes
//! - **Input Composition** ([`input`]) - Control file and sidecar structure file generation
//! - **Process Execution** ([`runner`]) - Blocking Packmol invocation with a timeout
//! - **Progress Monitoring** ([`progress`]) - User-facing status callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub mod error;
pub mod estimator;
pub(crate) mod format;
pub mod input;
pub mod progress;
pub mod runner;
