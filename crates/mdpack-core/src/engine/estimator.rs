use super::config::{PackingBox, StructureSource, StructureSpec};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::load_structure;
use crate::core::models::structure::Structure;
use crate::core::volume::VolumeEstimator;
use std::borrow::Cow;
use tracing::{debug, info};

/// Resolves a structure source to a structure, loading it from disk if needed.
///
/// # Errors
///
/// Returns [`EngineError::StructureLoad`] if a structure file cannot be read.
pub fn resolve_structure(spec: &StructureSpec) -> Result<Cow<'_, Structure>, EngineError> {
    match &spec.source {
        StructureSource::InMemory(structure) => Ok(Cow::Borrowed(structure)),
        StructureSource::Path(path) => load_structure(path)
            .map(Cow::Owned)
            .map_err(|source| EngineError::StructureLoad {
                name: spec.name.clone(),
                source,
            }),
    }
}

/// Sizes a cubic box, anchored at the origin, large enough for every replica.
///
/// Each structure's absolute molecular volume is padded by multiplying with
/// `tolerance` and then scaled by its replica count; the box side is the cube root of
/// the total. The padding factor is a rough heuristic and not related to packing
/// density. A total volume of zero gives a zero-size box, which Packmol will reject.
///
/// # Errors
///
/// Returns an error if a structure file cannot be loaded or its volume cannot be estimated.
pub fn estimate_box(
    specs: &[StructureSpec],
    tolerance: f64,
    estimator: &dyn VolumeEstimator,
    reporter: &ProgressReporter,
) -> Result<PackingBox, EngineError> {
    let mut net_volume = 0.0;
    for spec in specs {
        let structure = resolve_structure(spec)?;
        let volume = estimator
            .molecular_volume(&structure, false)
            .map_err(|source| EngineError::Volume {
                name: spec.name.clone(),
                source,
            })?;
        debug!(
            "Structure '{}': {:.3} Å³ per molecule, {} copies.",
            spec.name, volume, spec.number
        );
        net_volume += volume * tolerance * spec.number as f64;
    }

    let side = net_volume.cbrt();
    let message = format!("Auto determined box size is {:.1} Å per side.", side);
    info!("{}", message);
    reporter.report(Progress::Message(message));

    Ok(PackingBox::Estimated { side })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::io::traits::MolecularFile;
    use crate::core::io::xyz::XyzFile;
    use crate::core::models::atom::Atom;
    use crate::core::volume::VolumeError;
    use nalgebra::Point3;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Reports one cubic Angstrom per atom, which makes box sizes easy to compute by hand.
    pub(crate) struct AtomCountVolume;

    impl VolumeEstimator for AtomCountVolume {
        fn molecular_volume(
            &self,
            structure: &Structure,
            _per_mole: bool,
        ) -> Result<f64, VolumeError> {
            Ok(structure.len() as f64)
        }
    }

    pub(crate) fn structure_with_atoms(title: &str, n: usize) -> Structure {
        Structure::from_atoms(
            title,
            (0..n)
                .map(|i| Atom::new("C", Point3::new(i as f64 * 1.5, 0.0, 0.0)))
                .collect(),
        )
    }

    #[test]
    fn estimate_box_sums_padded_volumes_and_takes_cube_root() {
        let specs = vec![
            StructureSpec::new("A", 2, structure_with_atoms("A", 2)),
            StructureSpec::new("B", 3, structure_with_atoms("B", 1)),
        ];
        let packing_box =
            estimate_box(&specs, 2.0, &AtomCountVolume, &ProgressReporter::new()).unwrap();

        match packing_box {
            PackingBox::Estimated { side } => assert!((side - 14f64.cbrt()).abs() < 1e-12),
            other => panic!("Expected estimated box, got {:?}", other),
        }
        assert_eq!(packing_box.to_packmol_args(), "0.0 0.0 0.0 2.4 2.4 2.4");
    }

    #[test]
    fn estimate_box_is_deterministic() {
        let specs = vec![StructureSpec::new("A", 7, structure_with_atoms("A", 5))];
        let reporter = ProgressReporter::new();
        let first = estimate_box(&specs, 2.0, &AtomCountVolume, &reporter).unwrap();
        let second = estimate_box(&specs, 2.0, &AtomCountVolume, &reporter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn estimate_box_loads_structures_from_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trimer.xyz");
        XyzFile::write_to_path(&structure_with_atoms("trimer", 3), &path).unwrap();

        let specs = vec![StructureSpec::new("trimer", 9, path.as_path())];
        let packing_box =
            estimate_box(&specs, 1.0, &AtomCountVolume, &ProgressReporter::new()).unwrap();
        assert_eq!(packing_box.bounds()[5], 27f64.cbrt());
    }

    #[test]
    fn estimate_box_reports_side_length_message() {
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(msg) = event {
                messages.lock().unwrap().push(msg);
            }
        }));
        let specs = vec![StructureSpec::new("A", 4, structure_with_atoms("A", 2))];

        estimate_box(&specs, 1.0, &AtomCountVolume, &reporter).unwrap();
        drop(reporter);

        assert_eq!(
            messages.into_inner().unwrap(),
            vec!["Auto determined box size is 2.0 Å per side.".to_string()]
        );
    }

    #[test]
    fn zero_volume_yields_zero_box() {
        let specs = vec![StructureSpec::new("ghost", 3, Structure::new("ghost"))];
        let packing_box =
            estimate_box(&specs, 2.0, &AtomCountVolume, &ProgressReporter::new()).unwrap();
        assert_eq!(packing_box.to_packmol_args(), "0.0 0.0 0.0 0.0 0.0 0.0");
    }

    #[test]
    fn missing_structure_file_is_reported_with_its_name() {
        let specs = vec![StructureSpec::new("solvent", 1, "/nonexistent/solvent.xyz")];
        let result = estimate_box(&specs, 2.0, &AtomCountVolume, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::StructureLoad { ref name, .. }) if name == "solvent"
        ));
    }

    #[test]
    fn volume_errors_are_reported_with_structure_name() {
        struct Failing;
        impl VolumeEstimator for Failing {
            fn molecular_volume(&self, _: &Structure, _: bool) -> Result<f64, VolumeError> {
                Err(VolumeError::InvalidResolution(0.0))
            }
        }
        let specs = vec![StructureSpec::new("anion", 1, structure_with_atoms("anion", 1))];
        let result = estimate_box(&specs, 2.0, &Failing, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Volume { ref name, .. }) if name == "anion"
        ));
    }
}
