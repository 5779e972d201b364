//! Provides input/output functionality for molecular structure files.
//!
//! Packmol is always driven in `filetype xyz` mode by this crate, so XYZ is the one
//! format implemented here. The [`traits::MolecularFile`] trait keeps the door open for
//! other formats without touching the callers.

pub mod traits;
pub mod xyz;

use crate::core::models::structure::Structure;
use std::path::Path;
use thiserror::Error;
use traits::MolecularFile;
use xyz::{XyzError, XyzFile};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported structure file format '{extension}' for '{path}' (expected .xyz)")]
    UnsupportedFormat { path: String, extension: String },
    #[error("Failed to read structure file '{path}': {source}")]
    Xyz {
        path: String,
        #[source]
        source: XyzError,
    },
}

/// Loads a structure from disk, choosing the reader from the file extension.
///
/// # Errors
///
/// Returns [`LoadError::UnsupportedFormat`] for anything other than `.xyz`, or
/// [`LoadError::Xyz`] if the file cannot be read or parsed.
pub fn load_structure(path: &Path) -> Result<Structure, LoadError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "xyz" => XyzFile::read_from_path(path).map_err(|source| LoadError::Xyz {
            path: path.to_string_lossy().to_string(),
            source,
        }),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
            extension,
        }),
    }
}
