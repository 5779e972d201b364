use crate::core::volume::VolumeEstimator;
use crate::engine::config::{PackRequest, PackingBox};
use crate::engine::error::EngineError;
use crate::engine::input::compose_input;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::run_packer;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Files produced by a successful packing job.
#[derive(Debug, Clone, PartialEq)]
pub struct PackOutcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub screen_path: PathBuf,
    pub packing_box: Option<PackingBox>,
}

/// Runs a complete packing job: compose the input, run Packmol, check the output exists.
///
/// The Packmol timeout is taken from the request.
///
/// # Errors
///
/// Returns any error from input composition or the Packmol run, or
/// [`EngineError::MissingOutput`] if Packmol reported success without writing the
/// packed structure.
#[instrument(skip_all, name = "pack_workflow")]
pub fn run(
    request: &mut PackRequest,
    estimator: &dyn VolumeEstimator,
    reporter: &ProgressReporter,
) -> Result<PackOutcome, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Composing Packmol input",
    });
    info!(
        "Composing Packmol input for {} structure type(s).",
        request.structures().len()
    );
    compose_input(request, estimator, reporter)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Running Packmol",
    });
    run_packer(request, request.timeout())?;
    reporter.report(Progress::PhaseFinish);

    if !request.output_path().is_file() {
        return Err(EngineError::MissingOutput {
            path: request.output_path().to_path_buf(),
        });
    }
    info!("Packed structure written to {:?}", request.output_path());

    Ok(PackOutcome {
        input_path: request.input_path().to_path_buf(),
        output_path: request.output_path().to_path_buf(),
        screen_path: request.screen_path().to_path_buf(),
        packing_box: request.packing_box(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::io::traits::MolecularFile;
    use crate::core::io::xyz::XyzFile;
    use crate::engine::config::{PackRequestBuilder, StructureSpec};
    use crate::engine::estimator::tests::{AtomCountVolume, structure_with_atoms};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    /// A stand-in for Packmol that copies the first structure file to the requested output.
    fn fake_packmol(dir: &TempDir) -> String {
        let script = dir.path().join("fake_packmol.sh");
        fs::write(
            &script,
            "#!/bin/sh\n\
             input=$(cat)\n\
             out=$(printf '%s\\n' \"$input\" | sed -n 's/^output \"\\(.*\\)\"$/\\1/p')\n\
             first=$(printf '%s\\n' \"$input\" | sed -n 's/^structure //p' | head -n 1)\n\
             cp \"$first\" \"$out\"\n\
             echo 'Success!'\n",
        )
        .unwrap();
        format!("sh {}", script.display())
    }

    #[test]
    fn run_composes_packs_and_reports_outcome() {
        let dir = tempdir().unwrap();
        let exe = fake_packmol(&dir);
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("dimer", 2, structure_with_atoms("dimer", 2)))
            .executable(&exe)
            .build()
            .unwrap();

        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::PhaseStart { name } => phases.lock().unwrap().push(name.to_string()),
            Progress::Message(msg) => phases.lock().unwrap().push(msg),
            Progress::PhaseFinish => {}
        }));

        let outcome = run(&mut request, &AtomCountVolume, &reporter).unwrap();
        drop(reporter);

        assert_eq!(outcome.output_path, dir.path().join("packmol_out.xyz"));
        assert_eq!(
            outcome.packing_box,
            Some(PackingBox::Estimated {
                side: 8f64.cbrt()
            })
        );
        let packed = XyzFile::read_from_path(&outcome.output_path).unwrap();
        assert_eq!(packed.len(), 2);
        assert_eq!(
            fs::read_to_string(&outcome.screen_path).unwrap(),
            "Success!\n"
        );
        assert_eq!(
            phases.into_inner().unwrap(),
            vec![
                "Composing Packmol input".to_string(),
                "Auto determined box size is 2.0 Å per side.".to_string(),
                "Running Packmol".to_string(),
            ]
        );
    }

    #[test]
    fn run_fails_when_packmol_writes_no_output() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("silent.sh");
        fs::write(&script, "#!/bin/sh\ncat > /dev/null\necho done\n").unwrap();
        let mut request = PackRequestBuilder::new()
            .working_dir(dir.path())
            .structure(StructureSpec::new("W", 1, "/data/w.xyz"))
            .box_bounds([0.0, 0.0, 0.0, 5.0, 5.0, 5.0])
            .executable(&format!("sh {}", script.display()))
            .build()
            .unwrap();

        let result = run(&mut request, &AtomCountVolume, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::MissingOutput { .. })));
        assert!(request.screen_path().exists());
    }
}
