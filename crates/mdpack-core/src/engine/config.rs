use super::format::format_float;
use crate::core::models::structure::Structure;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TOLERANCE: f64 = 2.0;
pub const DEFAULT_SEED: i64 = 1;
/// Seed value that asks Packmol to derive its own seed from the current time.
pub const RANDOM_SEED: i64 = -1;
pub const DEFAULT_INPUT_FILE: &str = "packmol.inp";
pub const DEFAULT_OUTPUT_FILE: &str = "packmol_out.xyz";
pub const SCREEN_FILE: &str = "packmol.stdout";
pub const DEFAULT_EXECUTABLE: &str = "packmol";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("At least one structure is required")]
    NoStructures,
    #[error("Structure '{name}' must have a positive replica count")]
    ZeroReplicaCount { name: String },
    #[error("Working directory must not contain whitespace: '{}'", .0.display())]
    WhitespaceInPath(PathBuf),
    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

/// Where the coordinates of a structure come from.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureSource {
    /// A structure held in memory; written to a sidecar XYZ file when the input is composed.
    InMemory(Structure),
    /// A structure file on disk, handed to Packmol as is.
    Path(PathBuf),
}

impl From<Structure> for StructureSource {
    fn from(structure: Structure) -> Self {
        StructureSource::InMemory(structure)
    }
}

impl From<PathBuf> for StructureSource {
    fn from(path: PathBuf) -> Self {
        StructureSource::Path(path)
    }
}

impl From<&Path> for StructureSource {
    fn from(path: &Path) -> Self {
        StructureSource::Path(path.to_path_buf())
    }
}

impl From<&str> for StructureSource {
    fn from(path: &str) -> Self {
        StructureSource::Path(PathBuf::from(path))
    }
}

impl From<String> for StructureSource {
    fn from(path: String) -> Self {
        StructureSource::Path(PathBuf::from(path))
    }
}

/// One kind of molecule to pack, with the number of copies Packmol should place.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSpec {
    pub name: String,
    pub number: usize,
    pub source: StructureSource,
}

impl StructureSpec {
    pub fn new(name: &str, number: usize, source: impl Into<StructureSource>) -> Self {
        Self {
            name: name.to_string(),
            number,
            source: source.into(),
        }
    }
}

/// A single value of a pass-through control option.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", format_float(*v)),
            ScalarValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Text(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Text(v)
    }
}

/// The value of a control option: a scalar, or a list written space-separated.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Scalar(v) => write!(f, "{}", v),
            ControlValue::List(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join(" "))
            }
        }
    }
}

impl From<ScalarValue> for ControlValue {
    fn from(v: ScalarValue) -> Self {
        ControlValue::Scalar(v)
    }
}

impl From<i64> for ControlValue {
    fn from(v: i64) -> Self {
        ControlValue::Scalar(v.into())
    }
}

impl From<f64> for ControlValue {
    fn from(v: f64) -> Self {
        ControlValue::Scalar(v.into())
    }
}

impl From<&str> for ControlValue {
    fn from(v: &str) -> Self {
        ControlValue::Scalar(v.into())
    }
}

impl From<String> for ControlValue {
    fn from(v: String) -> Self {
        ControlValue::Scalar(v.into())
    }
}

impl From<Vec<ScalarValue>> for ControlValue {
    fn from(values: Vec<ScalarValue>) -> Self {
        ControlValue::List(values)
    }
}

impl<T: Into<ScalarValue>> FromIterator<T> for ControlValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ControlValue::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Ordered pass-through Packmol options, emitted in insertion order.
///
/// Setting an existing key replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlOptions {
    entries: Vec<(String, ControlValue)>,
}

impl ControlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<ControlValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ControlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ControlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The box every structure is packed into.
#[derive(Debug, Clone, PartialEq)]
pub enum PackingBox {
    /// Caller-supplied bounds in (xlo, ylo, zlo, xhi, yhi, zhi) order, passed through unvalidated.
    Explicit([f64; 6]),
    /// A cube anchored at the origin, sized from molecular volumes.
    Estimated { side: f64 },
}

impl PackingBox {
    pub fn bounds(&self) -> [f64; 6] {
        match *self {
            PackingBox::Explicit(bounds) => bounds,
            PackingBox::Estimated { side } => [0.0, 0.0, 0.0, side, side, side],
        }
    }

    /// Renders the six arguments of an `inside box` line.
    ///
    /// Explicit bounds use the plain float rendering; estimated sides are rounded to
    /// one decimal place.
    pub fn to_packmol_args(&self) -> String {
        match *self {
            PackingBox::Explicit(bounds) => bounds
                .iter()
                .map(|v| format_float(*v))
                .collect::<Vec<_>>()
                .join(" "),
            PackingBox::Estimated { side } => {
                format!("0.0 0.0 0.0 {:.1} {:.1} {:.1}", side, side, side)
            }
        }
    }
}

/// Everything needed to compose and run one Packmol job.
///
/// Built once per job with [`PackRequestBuilder`]. The only state that changes after
/// construction is the estimated box, which is computed on the first input composition
/// and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct PackRequest {
    working_dir: PathBuf,
    structures: Vec<StructureSpec>,
    explicit_box: Option<[f64; 6]>,
    estimated_box: Option<f64>,
    tolerance: f64,
    seed: i64,
    control: ControlOptions,
    input_path: PathBuf,
    output_path: PathBuf,
    screen_path: PathBuf,
    executable: String,
    timeout: Duration,
}

impl PackRequest {
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn structures(&self) -> &[StructureSpec] {
        &self.structures
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn control(&self) -> &ControlOptions {
        &self.control
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn screen_path(&self) -> &Path {
        &self.screen_path
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the explicit box, or the estimated box once one has been computed.
    pub fn packing_box(&self) -> Option<PackingBox> {
        self.explicit_box
            .map(PackingBox::Explicit)
            .or_else(|| self.estimated_box.map(|side| PackingBox::Estimated { side }))
    }

    pub(crate) fn cache_estimated_box(&mut self, side: f64) {
        self.estimated_box = Some(side);
    }
}

#[derive(Default)]
pub struct PackRequestBuilder {
    working_dir: Option<PathBuf>,
    structures: Vec<StructureSpec>,
    explicit_box: Option<[f64; 6]>,
    tolerance: Option<f64>,
    seed: Option<i64>,
    control: ControlOptions,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    executable: Option<String>,
    timeout: Option<Duration>,
}

impl PackRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
    pub fn structure(mut self, spec: StructureSpec) -> Self {
        self.structures.push(spec);
        self
    }
    pub fn structures(mut self, specs: impl IntoIterator<Item = StructureSpec>) -> Self {
        self.structures.extend(specs);
        self
    }
    pub fn box_bounds(mut self, bounds: [f64; 6]) -> Self {
        self.explicit_box = Some(bounds);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn control_option(mut self, key: &str, value: impl Into<ControlValue>) -> Self {
        self.control.set(key, value);
        self
    }
    pub fn control_options(mut self, options: ControlOptions) -> Self {
        for (key, value) in options.iter() {
            self.control.set(key, value.clone());
        }
        self
    }
    pub fn input_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.input_file = Some(name.into());
        self
    }
    pub fn output_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.output_file = Some(name.into());
        self
    }
    pub fn executable(mut self, executable: &str) -> Self {
        self.executable = Some(executable.to_string());
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<PackRequest, ConfigError> {
        let working_dir = self
            .working_dir
            .ok_or(ConfigError::MissingParameter("working_dir"))?;
        if working_dir.to_string_lossy().chars().any(char::is_whitespace) {
            return Err(ConfigError::WhitespaceInPath(working_dir));
        }
        if self.structures.is_empty() {
            return Err(ConfigError::NoStructures);
        }
        if let Some(spec) = self.structures.iter().find(|s| s.number == 0) {
            return Err(ConfigError::ZeroReplicaCount {
                name: spec.name.clone(),
            });
        }
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let input_file = self
            .input_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE));
        let output_file = self
            .output_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        Ok(PackRequest {
            input_path: working_dir.join(input_file),
            output_path: working_dir.join(output_file),
            screen_path: working_dir.join(SCREEN_FILE),
            working_dir,
            structures: self.structures,
            explicit_box: self.explicit_box,
            estimated_box: None,
            tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            control: self.control,
            executable: self
                .executable
                .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string()),
            timeout,
        })
    }
}
