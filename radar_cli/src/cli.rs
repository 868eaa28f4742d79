//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls the final summary).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "radar", version, about = "Sweeping radar controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/radar_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sweep-and-detect loop
    Scan {
        /// Stop after this many completed sweep cycles; runs until
        /// Ctrl-C when omitted
        #[arg(long, value_name = "N")]
        sweeps: Option<u64>,

        /// Override the detection range (cm, takes precedence over config)
        #[arg(long, value_name = "CM", allow_negative_numbers = true)]
        range_cm: Option<f32>,

        /// Override the angular step (degrees)
        #[arg(long, value_name = "DEG")]
        step_deg: Option<i32>,

        /// Override the per-angle settle delay (ms)
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Print iteration timing stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
