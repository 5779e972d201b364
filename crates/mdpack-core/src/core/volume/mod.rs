//! Molecular volume estimation.
//!
//! Volumes are used only to size a packing box, so the estimate is a plain
//! union-of-spheres count on a cubic grid. The [`VolumeEstimator`] trait is the seam
//! through which callers (and tests) can substitute a different estimate.

pub mod radii;

use crate::core::models::structure::Structure;
use nalgebra::Point3;
use radii::RadiiTable;
use thiserror::Error;

/// Avogadro's number times 1e-24, converting Å³ per molecule into cm³ per mole.
const CUBIC_ANGSTROM_TO_CM3_PER_MOL: f64 = 6.022_140_76e23 * 1e-24;

pub const DEFAULT_GRID_RESOLUTION: f64 = 0.1;

/// Upper bound on the number of grid points sampled for one structure.
const MAX_GRID_POINTS: usize = 1 << 28;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("No radius for element '{element}' in radii table '{table}'")]
    UnknownElement { element: String, table: String },
    #[error("Grid resolution must be positive (got {0})")]
    InvalidResolution(f64),
    #[error("Structure is too large to sample on a {resolution} Å grid")]
    GridTooLarge { resolution: f64 },
}

/// Estimates the volume occupied by a single molecule.
pub trait VolumeEstimator {
    /// Returns the molecular volume of `structure`.
    ///
    /// With `per_mole == false` the result is in Å³ per molecule; otherwise it is the
    /// molar volume in cm³/mol.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure contains atoms the estimator cannot size.
    fn molecular_volume(&self, structure: &Structure, per_mole: bool) -> Result<f64, VolumeError>;
}

/// Union-of-spheres volume counted on a cubic grid.
///
/// Every grid point (spacing `resolution`) that falls inside at least one atomic sphere
/// contributes `resolution³` to the volume.
#[derive(Debug, Clone, PartialEq)]
pub struct GridVolumeEstimator {
    radii: RadiiTable,
    resolution: f64,
    exclude_hydrogens: bool,
}

impl Default for GridVolumeEstimator {
    fn default() -> Self {
        Self {
            radii: RadiiTable::default(),
            resolution: DEFAULT_GRID_RESOLUTION,
            exclude_hydrogens: true,
        }
    }
}

impl GridVolumeEstimator {
    pub fn new(radii: RadiiTable) -> Self {
        Self {
            radii,
            ..Self::default()
        }
    }

    /// Sets the grid spacing in Angstroms.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidResolution`] unless `resolution` is finite and positive.
    pub fn with_resolution(mut self, resolution: f64) -> Result<Self, VolumeError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(VolumeError::InvalidResolution(resolution));
        }
        self.resolution = resolution;
        Ok(self)
    }

    /// Controls whether hydrogens contribute to the volume (they are excluded by default).
    pub fn with_hydrogens(mut self, include: bool) -> Self {
        self.exclude_hydrogens = !include;
        self
    }

    pub fn radii(&self) -> &RadiiTable {
        &self.radii
    }

    fn spheres(&self, structure: &Structure) -> Result<Vec<(Point3<f64>, f64)>, VolumeError> {
        structure
            .atoms()
            .iter()
            .filter(|atom| !(self.exclude_hydrogens && atom.is_hydrogen()))
            .map(|atom| {
                let element = atom.normalized_element();
                self.radii
                    .radius(&element)
                    .map(|r| (atom.position, r))
                    .ok_or_else(|| VolumeError::UnknownElement {
                        element,
                        table: self.radii.name(),
                    })
            })
            .collect()
    }

    fn grid_dims(&self, min: &Point3<f64>, max: &Point3<f64>) -> Result<[usize; 3], VolumeError> {
        let too_large = || VolumeError::GridTooLarge {
            resolution: self.resolution,
        };
        let mut dims = [0usize; 3];
        for (axis, dim) in dims.iter_mut().enumerate() {
            let cells = ((max[axis] - min[axis]) / self.resolution).ceil();
            if !cells.is_finite() || cells >= MAX_GRID_POINTS as f64 {
                return Err(too_large());
            }
            *dim = cells as usize + 1;
        }
        dims.iter()
            .try_fold(1usize, |total, &d| total.checked_mul(d))
            .filter(|&total| total <= MAX_GRID_POINTS)
            .map(|_| dims)
            .ok_or_else(too_large)
    }

    fn grid_volume(
        &self,
        structure: &Structure,
        spheres: &[(Point3<f64>, f64)],
    ) -> Result<f64, VolumeError> {
        let Some((lo, hi)) = structure.bounding_box() else {
            return Ok(0.0);
        };
        if spheres.is_empty() {
            return Ok(0.0);
        }
        let pad = spheres.iter().map(|&(_, r)| r).fold(0.0, f64::max);
        let min = lo.map(|c| c - pad);
        let max = hi.map(|c| c + pad);

        let res = self.resolution;
        let dims = self.grid_dims(&min, &max)?;
        let mut occupied = vec![false; dims[0] * dims[1] * dims[2]];

        for &(center, radius) in spheres {
            let r2 = radius * radius;
            let range = |axis: usize| {
                let lo = ((center[axis] - radius - min[axis]) / res).floor().max(0.0) as usize;
                let hi = (((center[axis] + radius - min[axis]) / res).ceil() as usize)
                    .min(dims[axis] - 1);
                lo..=hi
            };
            for i in range(0) {
                let dx = min.x + i as f64 * res - center.x;
                for j in range(1) {
                    let dy = min.y + j as f64 * res - center.y;
                    let dxy2 = dx * dx + dy * dy;
                    if dxy2 > r2 {
                        continue;
                    }
                    for k in range(2) {
                        let dz = min.z + k as f64 * res - center.z;
                        if dxy2 + dz * dz <= r2 {
                            occupied[(i * dims[1] + j) * dims[2] + k] = true;
                        }
                    }
                }
            }
        }

        let count = occupied.iter().filter(|&&cell| cell).count();
        Ok(count as f64 * res.powi(3))
    }
}

impl VolumeEstimator for GridVolumeEstimator {
    fn molecular_volume(&self, structure: &Structure, per_mole: bool) -> Result<f64, VolumeError> {
        let spheres = self.spheres(structure)?;
        let volume = self.grid_volume(structure, &spheres)?;
        if per_mole {
            Ok(volume * CUBIC_ANGSTROM_TO_CM3_PER_MOL)
        } else {
            Ok(volume)
        }
    }
}
