use crate::cli::JobArgs;
use crate::config::{JobConfig, build_job};
use crate::error::Result;
use mdpack::core::volume::{GridVolumeEstimator, VolumeEstimator};
use mdpack::engine::error::EngineError;
use mdpack::engine::estimator::{estimate_box, resolve_structure};
use mdpack::engine::progress::ProgressReporter;
use tracing::info;

pub async fn run(args: JobArgs) -> Result<()> {
    let JobConfig { request, radii } = build_job(&args)?;
    let estimator = GridVolumeEstimator::new(radii);
    info!(
        "Estimating volumes with the '{}' radii table.",
        estimator.radii().name()
    );

    println!(
        "{:<20} {:>8} {:>14} {:>14}",
        "structure", "number", "volume (Å³)", "cm³/mol"
    );
    for spec in request.structures() {
        let structure = resolve_structure(spec)?;
        let volume_error = |source| EngineError::Volume {
            name: spec.name.clone(),
            source,
        };
        let absolute = estimator
            .molecular_volume(&structure, false)
            .map_err(volume_error)?;
        let molar = estimator
            .molecular_volume(&structure, true)
            .map_err(volume_error)?;
        println!(
            "{:<20} {:>8} {:>14.3} {:>14.3}",
            spec.name, spec.number, absolute, molar
        );
    }

    let packing_box = estimate_box(
        request.structures(),
        request.tolerance(),
        &estimator,
        &ProgressReporter::new(),
    )?;
    let side = packing_box.bounds()[3];
    println!(
        "\nEstimated box (tolerance {}): {:.1} Å per side ({})",
        request.tolerance(),
        side,
        packing_box.to_packmol_args()
    );
    if let Some(explicit) = request.packing_box() {
        println!(
            "Note: the job sets an explicit box ({}), which is used instead.",
            explicit.to_packmol_args()
        );
    }
    Ok(())
}
