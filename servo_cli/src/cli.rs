//! CLI argument definitions and shared statics.

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Used when `--config` is not given; missing file means built-in defaults.
pub const DEFAULT_CONFIG: &str = "etc/servo_config.toml";

#[derive(Parser, Debug)]
#[command(name = "servo", version, about = "Feedback servo CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON, log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Move the horn to an absolute or relative position
    Move(MoveArgs),
    /// Print the current position and raw feedback
    Read,
    /// Make the current horn position the new zero point
    Zero {
        /// Write the updated [servo] record to this TOML file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Measure the feedback range around the zero point
    Calibrate {
        /// Write the updated [servo] record to this TOML file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Dump channels, flags, bounds and a live feedback reading
    Status,
    /// Quick health check (feedback presence / sim ok)
    SelfCheck,
}

#[derive(Args, Debug, Clone, Copy)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["degrees", "pulse", "offset"])
))]
pub struct MoveArgs {
    /// Absolute position in degrees (0..=180)
    #[arg(long)]
    pub degrees: Option<u8>,
    /// Absolute position as a pulse width in microseconds
    #[arg(long, value_name = "US")]
    pub pulse: Option<u16>,
    /// Signed offset from the zero point in microseconds
    #[arg(long, value_name = "US", allow_negative_numbers = true)]
    pub offset: Option<i16>,
    /// Block until the feedback settles
    #[arg(long, action = ArgAction::SetTrue)]
    pub wait: bool,
    /// Keep driving the position this long before releasing (Ctrl-C ends early)
    #[arg(long, value_name = "MS")]
    pub hold_ms: Option<u64>,
    /// Apply the offset only after this delay
    #[arg(long, value_name = "MS", requires = "offset")]
    pub after_ms: Option<u64>,
}
