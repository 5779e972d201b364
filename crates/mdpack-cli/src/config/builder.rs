use super::file::FileConfig;
use crate::cli::JobArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, RadiiSource};
use mdpack::core::volume::radii::RadiiTable;
use mdpack::engine::config::{
    ControlOptions, ControlValue, PackRequest, PackRequestBuilder, ScalarValue, StructureSpec,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// A fully resolved job: the core request plus the radii used for box estimation.
#[derive(Debug)]
pub struct JobConfig {
    pub request: PackRequest,
    pub radii: RadiiTable,
}

/// Reads the job file named by `args` and merges the command-line overrides into it.
///
/// Relative paths in the job file are resolved against the job file's directory, which is
/// also the working directory when none is given.
pub fn build_job(args: &JobArgs) -> Result<JobConfig> {
    let file_config = FileConfig::from_file(&args.config)?;
    let base_dir = job_dir(&args.config)?;
    build_job_from(file_config, args, &base_dir)
}

fn job_dir(config_path: &Path) -> Result<PathBuf> {
    let parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(std::path::absolute(parent)?)
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn build_job_from(file_config: FileConfig, args: &JobArgs, base_dir: &Path) -> Result<JobConfig> {
    let file = apply_set_values(file_config, &args.set_values)?;

    let working_dir = match (&args.working_dir, &file.working_dir) {
        (Some(cli), _) => cli.clone(),
        (None, Some(path)) => resolve_relative(base_dir, path),
        (None, None) => base_dir.to_path_buf(),
    };

    let mut builder = PackRequestBuilder::new()
        .working_dir(working_dir)
        .structures(file.structures.iter().map(|s| {
            StructureSpec::new(&s.name, s.number, resolve_relative(base_dir, &s.path))
        }))
        .control_options(control_options_from_table(&file.control)?);

    if let Some(tolerance) = args.tolerance.or(file.tolerance) {
        builder = builder.tolerance(tolerance);
    }
    if let Some(seed) = args.seed.or(file.seed) {
        builder = builder.seed(seed);
    }
    if let Some(bounds) = args.box_bounds.as_ref().or(file.box_bounds.as_ref()) {
        builder = builder.box_bounds(box_from_slice(bounds)?);
    }
    if let Some(name) = file.input_file {
        builder = builder.input_file(name);
    }
    if let Some(name) = file.output_file {
        builder = builder.output_file(name);
    }
    if let Some(executable) = args.executable.as_ref().or(file.executable.as_ref()) {
        builder = builder.executable(executable);
    }
    if let Some(seconds) = args.timeout.or(file.timeout_seconds) {
        builder = builder.timeout(timeout_from_secs(seconds)?);
    }

    let request = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let radii_spec = args.radii.as_deref().or(file.radii.as_deref());
    let radii = resolve_radii(radii_spec, base_dir)?;
    debug!("Using radii table '{}'.", radii.name());

    Ok(JobConfig { request, radii })
}

fn box_from_slice(bounds: &[f64]) -> Result<[f64; 6]> {
    <[f64; 6]>::try_from(bounds).map_err(|_| {
        CliError::Config(format!(
            "`box` needs exactly 6 values (xlo ylo zlo xhi yhi zhi), got {}",
            bounds.len()
        ))
    })
}

fn timeout_from_secs(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| CliError::Config(format!("Invalid timeout: {} seconds", seconds)))
}

fn resolve_radii(spec: Option<&str>, base_dir: &Path) -> Result<RadiiTable> {
    let Some(spec) = spec else {
        return Ok(RadiiTable::default());
    };
    match spec
        .parse::<RadiiSource>()
        .map_err(|e| CliError::Argument(e.to_string()))?
    {
        RadiiSource::Builtin(set) => Ok(RadiiTable::Builtin(set)),
        RadiiSource::CsvFile(path) => {
            let path = resolve_relative(base_dir, &path);
            RadiiTable::from_csv_path(&path).map_err(|e| CliError::FileParsing {
                path,
                source: e.into(),
            })
        }
    }
}

fn scalar_from_toml(key: &str, value: &toml::Value) -> Result<ScalarValue> {
    match value {
        toml::Value::Integer(v) => Ok(ScalarValue::Int(*v)),
        toml::Value::Float(v) => Ok(ScalarValue::Float(*v)),
        toml::Value::String(v) => Ok(ScalarValue::Text(v.clone())),
        other => Err(CliError::Config(format!(
            "Control option `{}` has unsupported value type '{}'",
            key,
            other.type_str()
        ))),
    }
}

fn control_options_from_table(table: &toml::Table) -> Result<ControlOptions> {
    let mut options = ControlOptions::new();
    for (key, value) in table {
        let control_value = match value {
            toml::Value::Array(items) => ControlValue::List(
                items
                    .iter()
                    .map(|item| scalar_from_toml(key, item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            scalar => ControlValue::Scalar(scalar_from_toml(key, scalar)?),
        };
        options.set(key, control_value);
    }
    Ok(options)
}

fn control_value_to_toml(value: ControlValue) -> toml::Value {
    fn scalar(value: ScalarValue) -> toml::Value {
        match value {
            ScalarValue::Int(v) => toml::Value::Integer(v),
            ScalarValue::Float(v) => toml::Value::Float(v),
            ScalarValue::Text(v) => toml::Value::String(v),
        }
    }
    match value {
        ControlValue::Scalar(v) => scalar(v),
        ControlValue::List(values) => toml::Value::Array(values.into_iter().map(scalar).collect()),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        if let Some(option) = key.strip_prefix("control.") {
            let value = parser::parse_control_value(option, value_str)
                .map_err(|e| CliError::Config(e.to_string()))?;
            config
                .control
                .insert(option.to_string(), control_value_to_toml(value));
            continue;
        }

        match key {
            "working-dir" => config.working_dir = Some(PathBuf::from(value_str)),
            "tolerance" => config.tolerance = Some(parse_value(key, value_str, "float")?),
            "seed" => config.seed = Some(parse_value(key, value_str, "integer")?),
            "input-file" => config.input_file = Some(PathBuf::from(value_str)),
            "output-file" => config.output_file = Some(PathBuf::from(value_str)),
            "executable" => config.executable = Some(value_str.to_string()),
            "timeout-seconds" => {
                config.timeout_seconds = Some(parse_value(key, value_str, "float")?)
            }
            "radii" => config.radii = Some(value_str.to_string()),
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
