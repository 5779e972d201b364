use crate::cli::JobArgs;
use crate::config::{JobConfig, build_job};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdpack::core::volume::GridVolumeEstimator;
use mdpack::engine::input::compose_input;
use mdpack::engine::progress::ProgressReporter;
use tracing::info;

pub async fn run(args: JobArgs) -> Result<()> {
    info!("Merging job file {:?} with command-line overrides...", &args.config);
    let JobConfig { mut request, radii } = build_job(&args)?;
    let estimator = GridVolumeEstimator::new(radii);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    tokio::task::block_in_place(|| compose_input(&mut request, &estimator, &reporter))?;

    println!(
        "✓ Packmol input written to: {}",
        request.input_path().display()
    );
    if let Some(packing_box) = request.packing_box() {
        println!("  Box: {}", packing_box.to_packmol_args());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{job_args, write_water_job};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_control_file_next_to_job() {
        let dir = tempdir().unwrap();
        let job = write_water_job(dir.path(), 10, "[control]\nnloop = 20\n");

        run(job_args(job)).await.unwrap();

        let content = fs::read_to_string(dir.path().join("packmol.inp")).unwrap();
        assert!(content.starts_with("# 10 water\n"));
        assert!(content.contains("nloop 20\n"));
        assert!(content.contains(&format!(
            "structure {}\n  number 10\n",
            dir.path().join("water.xyz").display()
        )));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn explicit_box_is_written_verbatim() {
        let dir = tempdir().unwrap();
        let job = write_water_job(dir.path(), 3, "");
        let mut args = job_args(job);
        args.box_bounds = Some(vec![-5.0, -5.0, -5.0, 5.0, 5.0, 5.0]);

        run(args).await.unwrap();

        let content = fs::read_to_string(dir.path().join("packmol.inp")).unwrap();
        assert!(content.contains("  inside box -5.0 -5.0 -5.0 5.0 5.0 5.0\n"));
    }
}
