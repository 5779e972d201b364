use nalgebra::Point3;

/// Returns an element symbol in canonical capitalization ("cl" becomes "Cl").
///
/// XYZ writers are inconsistent about symbol case and sometimes append digits
/// (e.g., "C1", "H12"), so only the leading alphabetic characters are kept.
pub fn normalize_element(symbol: &str) -> String {
    let letters: String = symbol
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let mut chars = letters.chars();
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase())
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Represents an atom in a molecular structure.
///
/// Packmol only cares about element symbols and coordinates, so this is all the
/// information carried per atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The element symbol as written in the source file (e.g., "C", "Li", "O").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` from an element symbol and a position.
    ///
    /// # Arguments
    ///
    /// * `element` - The element symbol of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            position,
        }
    }

    /// Returns the element symbol in canonical capitalization (see [`normalize_element`]).
    pub fn normalized_element(&self) -> String {
        normalize_element(&self.element)
    }

    /// Returns `true` if the atom is a hydrogen (including the "D" and "T" isotopes).
    pub fn is_hydrogen(&self) -> bool {
        matches!(self.normalized_element().as_str(), "H" | "D" | "T")
    }
}
