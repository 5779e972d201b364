use super::config::ConfigError;
use crate::core::io::LoadError;
use crate::core::volume::VolumeError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid packing request: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load structure '{name}': {source}")]
    StructureLoad {
        name: String,
        #[source]
        source: LoadError,
    },

    #[error("Volume estimation failed for structure '{name}': {source}")]
    Volume {
        name: String,
        #[source]
        source: VolumeError,
    },

    #[error("Packmol failed with {}: {diagnostic}", exit_status_label(.exit_code))]
    ExternalToolFailure {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("Packmol did not finish within {:.1} seconds", .timeout.as_secs_f64())]
    ExternalToolTimeout { timeout: Duration },

    #[error("Packmol reported success but no output structure was written to '{}'", .path.display())]
    MissingOutput { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
