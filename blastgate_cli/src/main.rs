#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod error_fmt;
mod run;

use std::io::IsTerminal;

use blastgate_config::Config;
use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{CalibrationCmd, Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = try_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
            tracing::debug!(error = ?err, "command failed");
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn try_main(cli: Cli) -> Result<()> {
    let cfg = run::load_config(&cli.config)?;
    init_tracing(&cli, &cfg)?;
    tracing::debug!(config = %cli.config.display(), gates = cfg.gates.len(), "config loaded");

    match cli.cmd {
        Commands::Run { programming } => run::cmd_run(&cfg, programming, cli.json),
        Commands::Simulate {
            press,
            programming,
            knob,
            store,
        } => run::cmd_simulate(
            &cfg,
            &run::SimulateArgs {
                presses: &press,
                programming,
                knob: &knob,
                store: store.as_deref(),
            },
            cli.json,
        ),
        Commands::SelfCheck => run::cmd_self_check(&cfg, cli.json),
        Commands::Calibration { action } => match action {
            CalibrationCmd::Show => run::cmd_calibration_show(&cfg, cli.json),
            CalibrationCmd::Export { out } => run::cmd_calibration_export(&cfg, out.as_deref()),
            CalibrationCmd::Import { file } => {
                run::cmd_calibration_import(&cfg, &file, cli.json)
            }
            CalibrationCmd::Reset => run::cmd_calibration_reset(&cfg, cli.json),
        },
    }
}

/// Console logs go to stderr so stdout stays clean for command output.
/// Filter precedence: RUST_LOG, then --log-level, then [logging].level, then "info".
fn init_tracing(cli: &Cli, cfg: &Config) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => {
            let level = cli
                .log_level
                .as_deref()
                .or(cfg.logging.level.as_deref())
                .unwrap_or("info");
            EnvFilter::try_new(level)
        }
    }
    .wrap_err("invalid log filter")?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if cli.json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .boxed(),
        );
    }

    if let Some(file) = cfg.logging.file.as_deref() {
        let path = std::path::Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "blastgate.log".into(), |n| n.to_string_lossy().into_owned());
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("create log directory {}", dir.display()))?;
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, &name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, &name),
            _ => tracing_appender::rolling::never(dir, &name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
