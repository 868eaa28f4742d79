//! Binary entry point: logging setup, signal handling, dispatch.

mod cli;
mod scan;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

/// Console logging to stderr (pretty or JSON lines), plus an optional
/// JSON file sink from `[logging]` in the config. `RUST_LOG` overrides
/// the configured level.
fn init_logging(args: &Cli, logging: &radar_config::Logging) -> eyre::Result<()> {
    let level = logging
        .level
        .clone()
        .unwrap_or_else(|| args.log_level.clone());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    let console = if args.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match &logging.file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .map(std::ffi::OsStr::to_os_string)
                .unwrap_or_else(|| "radar.log".into());
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    let cfg = if args.config.exists() {
        let text = std::fs::read_to_string(&args.config)
            .wrap_err_with(|| format!("failed to read config {}", args.config.display()))?;
        radar_config::load_toml(&text)
            .wrap_err_with(|| format!("failed to parse config {}", args.config.display()))?
    } else {
        radar_config::Config::default()
    };
    cfg.validate()?;
    init_logging(&args, &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })?;
    }

    match &args.cmd {
        Commands::Scan {
            sweeps,
            range_cm,
            step_deg,
            delay_ms,
            stats,
        } => scan::run_scan(
            &cfg,
            &scan::ScanOverrides {
                sweeps: *sweeps,
                range_cm: *range_cm,
                step_deg: *step_deg,
                delay_ms: *delay_ms,
                stats: *stats,
            },
            shutdown,
        ),
        Commands::SelfCheck => scan::self_check(&cfg),
    }
}
