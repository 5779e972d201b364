use crate::cli::JobArgs;
use crate::config::{JobConfig, build_job};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdpack::core::volume::GridVolumeEstimator;
use mdpack::engine::progress::ProgressReporter;
use mdpack::workflows;
use tracing::info;

pub async fn run(args: JobArgs) -> Result<()> {
    info!("Merging job file {:?} with command-line overrides...", &args.config);
    let JobConfig { mut request, radii } = build_job(&args)?;
    let estimator = GridVolumeEstimator::new(radii);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Packing {} structure type(s) with '{}'...",
        request.structures().len(),
        request.executable()
    );
    info!("Invoking the core packing workflow...");

    let outcome = tokio::task::block_in_place(|| {
        workflows::pack::run(&mut request, &estimator, &reporter)
    })?;

    if let Some(packing_box) = &outcome.packing_box {
        println!("  Box: {}", packing_box.to_packmol_args());
    }
    println!("  Input:  {}", outcome.input_path.display());
    println!("  Log:    {}", outcome.screen_path.display());
    println!(
        "✓ Packed structure written to: {}",
        outcome.output_path.display()
    );
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::fixtures::{WATER_XYZ, job_args, write_water_job};
    use crate::error::CliError;
    use mdpack::engine::error::EngineError;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let script = dir.join(name);
        fs::write(&script, body).unwrap();
        format!("sh {}", script.display())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pack_runs_packmol_and_keeps_its_log() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("packmol_out.xyz");
        let exe = write_script(
            dir.path(),
            "packmol.sh",
            &format!(
                "#!/bin/sh\ncat > /dev/null\nprintf '{}' > '{}'\necho 'Success!'\n",
                WATER_XYZ.replace('\n', "\\n"),
                out.display()
            ),
        );
        let job = write_water_job(dir.path(), 4, "");
        let mut args = job_args(job);
        args.executable = Some(exe);

        run(args).await.unwrap();

        assert!(out.is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("packmol.stdout")).unwrap(),
            "Success!\n"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_band_packmol_error_fails_the_command() {
        let dir = tempdir().unwrap();
        let exe = write_script(
            dir.path(),
            "packmol.sh",
            "#!/bin/sh\ncat > /dev/null\necho 'ERROR: could not find a solution'\n",
        );
        let job = write_water_job(dir.path(), 4, "");
        let mut args = job_args(job);
        args.executable = Some(exe);

        let result = run(args).await;

        match result {
            Err(CliError::Core(EngineError::ExternalToolFailure {
                exit_code,
                diagnostic,
            })) => {
                assert_eq!(exit_code, Some(0));
                assert_eq!(diagnostic, ": could not find a solution\n");
            }
            other => panic!("Expected external tool failure, got {:?}", other),
        }
        assert!(!dir.path().join("packmol.stdout").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_packmol_times_out() {
        let dir = tempdir().unwrap();
        let exe = write_script(dir.path(), "packmol.sh", "#!/bin/sh\nsleep 5\n");
        let job = write_water_job(dir.path(), 1, "");
        let mut args = job_args(job);
        args.executable = Some(exe);
        args.timeout = Some(0.2);

        let result = run(args).await;
        assert!(matches!(
            result,
            Err(CliError::Core(EngineError::ExternalToolTimeout { .. }))
        ));
    }
}
