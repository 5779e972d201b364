use crate::core::models::atom::normalize_element;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Bondi van der Waals radii in Angstroms, extended with the Mantina main-group values.
#[rustfmt::skip]
static BONDI_RADII: Map<&'static str, f64> = phf_map! {
    // --- Period 1-2 ---
    "H" => 1.20, "He" => 1.40,
    "Li" => 1.82, "Be" => 1.53, "B" => 1.92, "C" => 1.70, "N" => 1.55, "O" => 1.52, "F" => 1.47, "Ne" => 1.54,

    // --- Period 3 ---
    "Na" => 2.27, "Mg" => 1.73, "Al" => 1.84, "Si" => 2.10, "P" => 1.80, "S" => 1.80, "Cl" => 1.75, "Ar" => 1.88,

    // --- Period 4 ---
    "K" => 2.75, "Ca" => 2.31, "Ni" => 1.63, "Cu" => 1.40, "Zn" => 1.39,
    "Ga" => 1.87, "Ge" => 2.11, "As" => 1.85, "Se" => 1.90, "Br" => 1.85, "Kr" => 2.02,

    // --- Period 5 ---
    "Rb" => 3.03, "Sr" => 2.49, "Pd" => 1.63, "Ag" => 1.72, "Cd" => 1.58,
    "In" => 1.93, "Sn" => 2.17, "Sb" => 2.06, "Te" => 2.06, "I" => 1.98, "Xe" => 2.16,

    // --- Period 6-7 ---
    "Cs" => 3.43, "Ba" => 2.68, "Pt" => 1.75, "Au" => 1.66, "Hg" => 1.55,
    "Tl" => 1.96, "Pb" => 2.02, "Bi" => 2.07, "U" => 1.86,
};

/// Empirical (Slater) atomic radii in Angstroms, as tabulated by pymatgen's `atomic_radius`.
/// Noble gases fall back to calculated radii.
#[rustfmt::skip]
static PYMATGEN_RADII: Map<&'static str, f64> = phf_map! {
    // --- Period 1-2 ---
    "H" => 0.25, "He" => 0.31,
    "Li" => 1.45, "Be" => 1.05, "B" => 0.85, "C" => 0.70, "N" => 0.65, "O" => 0.60, "F" => 0.50, "Ne" => 0.38,

    // --- Period 3 ---
    "Na" => 1.80, "Mg" => 1.50, "Al" => 1.25, "Si" => 1.10, "P" => 1.00, "S" => 1.00, "Cl" => 1.00, "Ar" => 0.71,

    // --- Period 4 ---
    "K" => 2.20, "Ca" => 1.80, "Sc" => 1.60, "Ti" => 1.40, "V" => 1.35, "Cr" => 1.40, "Mn" => 1.40,
    "Fe" => 1.40, "Co" => 1.35, "Ni" => 1.35, "Cu" => 1.35, "Zn" => 1.35,
    "Ga" => 1.30, "Ge" => 1.25, "As" => 1.15, "Se" => 1.15, "Br" => 1.15, "Kr" => 0.88,

    // --- Period 5 ---
    "Rb" => 2.35, "Sr" => 2.00, "Ag" => 1.60, "Cd" => 1.55,
    "In" => 1.55, "Sn" => 1.45, "Sb" => 1.45, "Te" => 1.40, "I" => 1.40, "Xe" => 1.08,

    // --- Period 6 ---
    "Cs" => 2.60, "Ba" => 2.15, "Pt" => 1.35, "Au" => 1.35, "Hg" => 1.50,
    "Pb" => 1.80, "Bi" => 1.60,
};

#[derive(Debug, Error)]
pub enum RadiiError {
    #[error("Unknown radii set '{0}' (expected 'bondi' or 'pymatgen')")]
    UnknownSet(String),
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Radius for element '{element}' must be positive (got {radius})")]
    InvalidRadius { element: String, radius: f64 },
    #[error("Radii table '{0}' contains no entries")]
    Empty(String),
}

/// The built-in radii tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadiiSet {
    /// Bondi van der Waals radii.
    Bondi,
    /// Empirical atomic radii; the set used when sizing packing boxes.
    #[default]
    Pymatgen,
}

impl RadiiSet {
    fn map(self) -> &'static Map<&'static str, f64> {
        match self {
            RadiiSet::Bondi => &BONDI_RADII,
            RadiiSet::Pymatgen => &PYMATGEN_RADII,
        }
    }
}

impl fmt::Display for RadiiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadiiSet::Bondi => write!(f, "bondi"),
            RadiiSet::Pymatgen => write!(f, "pymatgen"),
        }
    }
}

impl FromStr for RadiiSet {
    type Err = RadiiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bondi" => Ok(RadiiSet::Bondi),
            "pymatgen" => Ok(RadiiSet::Pymatgen),
            _ => Err(RadiiError::UnknownSet(s.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RadiusRecord {
    element: String,
    radius: f64,
}

/// A lookup from element symbol to radius, either built in or loaded from a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub enum RadiiTable {
    Builtin(RadiiSet),
    Custom {
        name: String,
        radii: HashMap<String, f64>,
    },
}

impl Default for RadiiTable {
    fn default() -> Self {
        RadiiTable::Builtin(RadiiSet::default())
    }
}

impl RadiiTable {
    /// Loads a custom radii table from a CSV file with `element,radius` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a radius is not positive,
    /// or the table is empty.
    pub fn from_csv_path(path: &Path) -> Result<Self, RadiiError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| RadiiError::Csv {
                path: path_str.clone(),
                source: e,
            })?;

        let mut radii = HashMap::new();
        for result in reader.deserialize::<RadiusRecord>() {
            let record = result.map_err(|e| RadiiError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            if record.radius.is_nan() || record.radius <= 0.0 {
                return Err(RadiiError::InvalidRadius {
                    element: record.element,
                    radius: record.radius,
                });
            }
            radii.insert(normalize_element(&record.element), record.radius);
        }

        if radii.is_empty() {
            return Err(RadiiError::Empty(path_str));
        }
        Ok(RadiiTable::Custom {
            name: path_str,
            radii,
        })
    }

    /// Looks up the radius of an element symbol in canonical capitalization.
    pub fn radius(&self, element: &str) -> Option<f64> {
        match self {
            RadiiTable::Builtin(set) => set.map().get(element).copied(),
            RadiiTable::Custom { radii, .. } => radii.get(element).copied(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            RadiiTable::Builtin(set) => set.to_string(),
            RadiiTable::Custom { name, .. } => name.clone(),
        }
    }
}
