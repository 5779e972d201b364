use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One `[[structures]]` entry of a job file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileStructure {
    pub name: String,
    pub number: usize,
    pub path: PathBuf,
}

/// A packing job as written in a TOML job file. Every field is optional so that
/// command-line flags can fill in or override any of them.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub working_dir: Option<PathBuf>,
    pub tolerance: Option<f64>,
    pub seed: Option<i64>,
    #[serde(rename = "box")]
    pub box_bounds: Option<Vec<f64>>,
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub executable: Option<String>,
    pub timeout_seconds: Option<f64>,
    pub radii: Option<String>,
    #[serde(default)]
    pub control: toml::Table,
    #[serde(default)]
    pub structures: Vec<FileStructure>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading job file from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
