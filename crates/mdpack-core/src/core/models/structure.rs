use super::atom::Atom;
use nalgebra::Point3;

/// A molecular structure: an ordered list of atoms plus a free-form title line.
///
/// This is the unit Packmol replicates inside the packing box. Atom order is preserved
/// exactly as read or constructed, since Packmol writes replicas in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    /// Free-form title (the comment line of an XYZ file).
    pub title: String,
    atoms: Vec<Atom>,
}

impl Structure {
    /// Creates a new, empty structure with the given title.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            atoms: Vec::new(),
        }
    }

    /// Creates a structure from a title and a list of atoms.
    pub fn from_atoms(title: &str, atoms: Vec<Atom>) -> Self {
        Self {
            title: title.to_string(),
            atoms,
        }
    }

    /// Appends an atom to the structure.
    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Computes the axis-aligned bounding box of all atom positions.
    ///
    /// # Return
    ///
    /// Returns `Some((min, max))` corner points, or `None` for an empty structure.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.atoms.first()?.position;
        let bounds = self
            .atoms
            .iter()
            .skip(1)
            .fold((first, first), |(min, max), atom| {
                (min.inf(&atom.position), max.sup(&atom.position))
            });
        Some(bounds)
    }
}
