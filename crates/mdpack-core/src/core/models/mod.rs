//! # Core Models Module
//!
//! Data structures representing the molecules handed to Packmol.
//!
//! - [`atom`] - A single atom: element symbol and position in Angstroms
//! - [`structure`] - An ordered collection of atoms with a title line

pub mod atom;
pub mod structure;
