//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "blastgate", version, about = "Blast-gate manifold controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/blastgate.toml")]
    pub config: PathBuf,

    /// Emit JSON: log lines, command results and errors
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the manifold and poll the buttons until Ctrl-C
    Run {
        /// Enter programming mode even if no button is held at boot
        #[arg(long, action = ArgAction::SetTrue)]
        programming: bool,
    },
    /// Replay button taps against simulated hardware and print the panel after each
    Simulate {
        /// Gate buttons to tap, in order (e.g. 2,2,4)
        #[arg(long, value_delimiter = ',', required = true, value_name = "GATES")]
        press: Vec<usize>,
        /// Boot in programming mode
        #[arg(long, action = ArgAction::SetTrue)]
        programming: bool,
        /// Knob readings (0..=1023) for endpoint captures, consumed in order
        /// by each tap that stores an endpoint
        #[arg(long, value_delimiter = ',', value_name = "ADC")]
        knob: Vec<u16>,
        /// Persist calibration in this image file instead of memory
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },
    /// Validate the config and inspect the calibration store without changing it
    SelfCheck,
    /// Inspect or edit the persisted gate calibration
    Calibration {
        #[command(subcommand)]
        action: CalibrationCmd,
    },
}

#[derive(Subcommand, Debug)]
pub enum CalibrationCmd {
    /// Print every gate's stored bytes and angles
    Show,
    /// Write the stored bytes as CSV (gate,open_raw,close_raw)
    Export {
        /// Output file; stdout when omitted
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Store endpoint bytes from a CSV (gate,open_raw,close_raw)
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Reset every gate to the neutral angle
    Reset,
}
