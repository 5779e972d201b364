use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mdpack CLI - Prepare and run Packmol jobs that pack molecules into a simulation box.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the Packmol input, run Packmol, and check the packed structure was produced.
    Pack(JobArgs),
    /// Only write the Packmol input file (and sidecar structure files).
    Input(JobArgs),
    /// Print molecular volumes and the estimated box size without writing any files.
    Estimate(JobArgs),
}

/// Arguments shared by every job subcommand.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    // --- Core Arguments ---
    /// Path to the packing job file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the working directory for generated files. Must not contain whitespace.
    #[arg(short, long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    // --- Packing Overrides ---
    /// Override the Packmol tolerance (minimum distance between molecules, in Å).
    #[arg(short, long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Override the random seed. Use -1 to let Packmol pick a seed from the clock.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Use an explicit box instead of estimating one: xlo ylo zlo xhi yhi zhi (Å).
    #[arg(
        long = "box",
        num_args = 6,
        value_names = ["XLO", "YLO", "ZLO", "XHI", "YHI", "ZHI"],
        allow_negative_numbers = true
    )]
    pub box_bounds: Option<Vec<f64>>,

    /// Override the radii used for box estimation: 'pymatgen', 'bondi', or a CSV file path.
    #[arg(long, value_name = "NAME_OR_PATH")]
    pub radii: Option<String>,

    // --- Execution Overrides ---
    /// Override the Packmol executable (a command name or path).
    #[arg(long, value_name = "COMMAND")]
    pub executable: Option<String>,

    /// Override the Packmol timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Set a specific configuration value, overriding the job file.
    /// Can be used multiple times. Example: -S control.nloop=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

impl Commands {
    pub fn job_args(&self) -> &JobArgs {
        match self {
            Commands::Pack(args) | Commands::Input(args) | Commands::Estimate(args) => args,
        }
    }
}
