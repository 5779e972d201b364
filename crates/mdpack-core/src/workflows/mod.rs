//! # Workflows Module
//!
//! High-level entry points that run a complete packing job.
//!
//! - **Packing Workflow** ([`pack`]) - Compose the Packmol input, run Packmol, and verify
//!   that the packed structure was written.

pub mod pack;
