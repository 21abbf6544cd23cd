//! Shared logging setup for Vigil binaries.
//!
//! Log output goes to stderr and, when a log directory is given, to a
//! daily-rolling file as well. The long-running monitor is expected to run
//! under a process supervisor, so stderr stays terse unless `--verbose` is
//! set while the file layer always records at the configured filter level.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "vigil=info,vigil_archive=info,vigil_telemetry=info";

/// Logging configuration shared by Vigil subcommands.
pub struct LogConfig<'a> {
    /// Directory to write `vigil.log.*` files to, if any.
    pub log_dir: Option<&'a Path>,
    /// Mirror the full filter to stderr instead of warnings only.
    pub verbose: bool,
}

/// Initialize tracing with an optional rolling file writer and stderr output.
///
/// The returned guard must be held for the lifetime of the process; dropping
/// it flushes and stops the background file writer.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let mut guard = None;
    let file_layer = match config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "vigil.log");
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(
                        EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
                    ),
            )
        }
        None => None,
    };

    let console_filter = if config.verbose {
        env_filter
    } else {
        EnvFilter::new("warn")
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
