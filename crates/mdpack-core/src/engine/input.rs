use super::config::{PackRequest, PackingBox, StructureSource};
use super::error::EngineError;
use super::estimator::estimate_box;
use super::format::format_float;
use super::progress::ProgressReporter;
use crate::core::io::traits::MolecularFile;
use crate::core::io::xyz::{XyzError, XyzFile};
use crate::core::volume::VolumeEstimator;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PROVENANCE_COMMENT: &str = "# Packmol input generated by mdpack.";

/// Returns the path of the sidecar file written for the in-memory structure at `index`.
pub fn sidecar_path(working_dir: &Path, index: usize) -> PathBuf {
    working_dir.join(format!("packmol_molecule_{}.xyz", index))
}

/// Returns the request's box, estimating and caching it on first use.
fn resolve_packing_box(
    request: &mut PackRequest,
    estimator: &dyn VolumeEstimator,
    reporter: &ProgressReporter,
) -> Result<PackingBox, EngineError> {
    if let Some(packing_box) = request.packing_box() {
        return Ok(packing_box);
    }
    let estimated = estimate_box(
        request.structures(),
        request.tolerance(),
        estimator,
        reporter,
    )?;
    if let PackingBox::Estimated { side } = estimated {
        request.cache_estimated_box(side);
    }
    Ok(estimated)
}

/// Maps each structure to the file Packmol should read, writing sidecar files for
/// in-memory structures.
fn resolve_structure_paths(request: &PackRequest) -> Result<Vec<PathBuf>, EngineError> {
    request
        .structures()
        .iter()
        .enumerate()
        .map(|(index, spec)| match &spec.source {
            StructureSource::Path(path) => Ok(path.clone()),
            StructureSource::InMemory(structure) => {
                let path = sidecar_path(request.working_dir(), index);
                debug!("Writing structure '{}' to {:?}", spec.name, path);
                XyzFile::write_to_path(structure, &path).map_err(|e| match e {
                    XyzError::Io(io) => EngineError::Io(io),
                    other => EngineError::Io(std::io::Error::other(other)),
                })?;
                Ok(path)
            }
        })
        .collect()
}

/// Renders the Packmol control file for `request`.
///
/// `structure_paths` must hold one path per structure, in request order.
pub fn render_input(
    request: &PackRequest,
    packing_box: &PackingBox,
    structure_paths: &[PathBuf],
) -> String {
    let summary: Vec<String> = request
        .structures()
        .iter()
        .map(|spec| format!("{} {}", spec.number, spec.name))
        .collect();

    let mut lines = vec![
        format!("# {}", summary.join(" + ")),
        PROVENANCE_COMMENT.to_string(),
    ];
    lines.extend(
        request
            .control()
            .iter()
            .map(|(key, value)| format!("{} {}", key, value)),
    );
    lines.push(format!("seed {}", request.seed()));
    lines.push(format!("tolerance {}", format_float(request.tolerance())));
    lines.push(String::new());

    lines.push("filetype xyz".to_string());
    lines.push(String::new());
    // Packmol only accepts double quotes around a path containing spaces.
    lines.push(format!("output \"{}\"", request.output_path().display()));
    lines.push(String::new());

    let box_args = packing_box.to_packmol_args();
    for (spec, path) in request.structures().iter().zip(structure_paths) {
        lines.push(format!("structure {}", path.display()));
        lines.push(format!("  number {}", spec.number));
        lines.push(format!("  inside box {}", box_args));
        lines.push("end structure".to_string());
        lines.push(String::new());
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Composes the Packmol control file and writes it to the request's input path.
///
/// If the request has no explicit box, one is estimated from molecular volumes (see
/// [`estimate_box`]) and cached on the request. In-memory structures are written to
/// `packmol_molecule_<index>.xyz` sidecar files in the working directory first; the
/// control file itself is only written once every sidecar exists, and is flushed and
/// closed before this function returns.
///
/// # Errors
///
/// File-system errors are returned unchanged as [`EngineError::Io`]. Box estimation
/// errors are returned as they come from [`estimate_box`].
pub fn compose_input(
    request: &mut PackRequest,
    estimator: &dyn VolumeEstimator,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    let packing_box = resolve_packing_box(request, estimator, reporter)?;
    let structure_paths = resolve_structure_paths(request)?;
    let content = render_input(request, &packing_box, &structure_paths);

    let mut writer = BufWriter::new(File::create(request.input_path())?);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    drop(writer);

    info!(
        "Wrote Packmol input for {} structure(s) to {:?}",
        request.structures().len(),
        request.input_path()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ControlValue, PackRequestBuilder, StructureSpec};
    use crate::engine::estimator::tests::{AtomCountVolume, structure_with_atoms};
    use std::fs;
    use tempfile::tempdir;

    fn compose(request: &mut PackRequest) -> String {
        compose_input(request, &AtomCountVolume, &ProgressReporter::new()).unwrap();
        fs::read_to_string(request.input_path()).unwrap()
    }

    #[test]
    fn explicit_box_request_renders_full_control_file() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("EMC", 2, "/data/EMC.xyz"))
            .structure(StructureSpec::new("Li", 1, "/data/Li.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 10.0, 10.0, 10.0])
            .control_option("nloop", 1000i64)
            .build()
            .unwrap();

        let content = compose(&mut request);
        let expected = format!(
            "# 2 EMC + 1 Li\n\
             # Packmol input generated by mdpack.\n\
             nloop 1000\n\
             seed 1\n\
             tolerance 2.0\n\
             \n\
             filetype xyz\n\
             \n\
             output \"{out}\"\n\
             \n\
             structure /data/EMC.xyz\n  number 2\n  inside box 0.0 0.0 0.0 10.0 10.0 10.0\nend structure\n\n\
             structure /data/Li.xyz\n  number 1\n  inside box 0.0 0.0 0.0 10.0 10.0 10.0\nend structure\n\n",
            out = dir.path().join("packmol_out.xyz").display()
        );
        assert_eq!(content, expected);
    }

    #[test]
    fn explicit_box_values_keep_caller_order() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([5.5, -1.0, 3.0, 20.0, 9.75, 30.0])
            .build()
            .unwrap();

        let content = compose(&mut request);
        assert!(content.contains("  inside box 5.5 -1.0 3.0 20.0 9.75 30.0\n"));
    }

    #[test]
    fn estimated_box_is_rounded_to_one_decimal_and_cached() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("A", 2, structure_with_atoms("A", 2)))
            .structure(StructureSpec::new("B", 3, structure_with_atoms("B", 1)))
            .build()
            .unwrap();

        let content = compose(&mut request);
        assert_eq!(content.matches("  inside box 0.0 0.0 0.0 2.4 2.4 2.4\n").count(), 2);
        assert_eq!(
            request.packing_box(),
            Some(PackingBox::Estimated {
                side: 14f64.cbrt()
            })
        );
    }

    #[test]
    fn output_path_is_always_double_quoted() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .output_file("packed system.xyz")
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();

        let content = compose(&mut request);
        let expected = format!(
            "output \"{}\"\n",
            dir.path().join("packed system.xyz").display()
        );
        assert!(content.contains(&expected));

        let mut plain = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let content = compose(&mut plain);
        assert!(content.contains("output \""));
        assert!(!content.contains("output '"));
    }

    #[test]
    fn one_block_per_structure_in_request_order() {
        let dir = tempdir().unwrap();
        let names = ["EC", "EMC", "Li", "PF6"];
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structures(
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| StructureSpec::new(name, i + 1, format!("/data/{}.xyz", name))),
            )
            .box_bounds([0.0, 0.0, 0.0, 30.0, 30.0, 30.0])
            .build()
            .unwrap();

        let content = compose(&mut request);
        assert_eq!(content.matches("\nstructure ").count(), names.len());
        assert_eq!(content.matches("\nend structure\n").count(), names.len());

        let structure_lines: Vec<&str> = content
            .lines()
            .filter(|line| line.starts_with("structure "))
            .collect();
        assert_eq!(
            structure_lines,
            vec![
                "structure /data/EC.xyz",
                "structure /data/EMC.xyz",
                "structure /data/Li.xyz",
                "structure /data/PF6.xyz"
            ]
        );
        assert!(content.contains("structure /data/PF6.xyz\n  number 4\n"));
    }

    #[test]
    fn in_memory_structures_are_written_as_indexed_sidecars() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("solvent", 5, "/data/solvent.xyz"))
            .structure(StructureSpec::new("ion", 2, structure_with_atoms("ion", 1)))
            .box_bounds([0.0, 0.0, 0.0, 10.0, 10.0, 10.0])
            .build()
            .unwrap();

        let content = compose(&mut request);
        let sidecar = dir.path().join("packmol_molecule_1.xyz");
        assert!(sidecar.exists());
        assert!(!dir.path().join("packmol_molecule_0.xyz").exists());
        assert!(content.contains(&format!("structure {}\n", sidecar.display())));

        let written = XyzFile::read_from_path(&sidecar).unwrap();
        assert_eq!(written, structure_with_atoms("ion", 1));
    }

    #[test]
    fn control_options_are_emitted_in_insertion_order_before_seed() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .control_option("movebadrandom", "yes")
            .control_option(
                "pbc",
                [0.0, 0.0, 0.0, 40.0, 40.0, 40.0]
                    .into_iter()
                    .collect::<ControlValue>(),
            )
            .control_option("nloop", 50i64)
            .seed(-1)
            .tolerance(2.5)
            .build()
            .unwrap();

        let content = compose(&mut request);
        let body: Vec<&str> = content.lines().skip(2).take(5).collect();
        assert_eq!(
            body,
            vec![
                "movebadrandom yes",
                "pbc 0.0 0.0 0.0 40.0 40.0 40.0",
                "nloop 50",
                "seed -1",
                "tolerance 2.5"
            ]
        );
    }

    #[test]
    fn compose_overwrites_previous_input() {
        let dir = tempdir().unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();
        fs::write(request.input_path(), "stale content that is much longer than needed\n".repeat(50))
            .unwrap();

        let content = compose(&mut request);
        assert!(content.starts_with("# 1 W\n"));
        assert!(!content.contains("stale"));
    }

    #[test]
    fn unwritable_working_dir_surfaces_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let mut request = PackRequestBuilder::new()
            .working_dir(&missing)
            .structure(StructureSpec::new("W", 1, "w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();

        let result = compose_input(&mut request, &AtomCountVolume, &ProgressReporter::new());
        match result {
            Err(EngineError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn failed_sidecar_write_leaves_control_file_untouched() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let mut request = PackRequestBuilder::new()
            .working_dir(&missing)
            .structure(StructureSpec::new("ion", 1, structure_with_atoms("ion", 1)))
            .box_bounds([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .build()
            .unwrap();

        let result = compose_input(&mut request, &AtomCountVolume, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Io(_))));
        assert!(!request.input_path().exists());
    }

    #[test]
    fn sidecar_path_is_named_by_index() {
        assert_eq!(
            sidecar_path(Path::new("/work"), 3),
            PathBuf::from("/work/packmol_molecule_3.xyz")
        );
    }
}
