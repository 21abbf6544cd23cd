//! `vigil telemeter`: deliver one staged file or the whole backlog.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use tracing::error;

use vigil::config::Config;
use vigil_telemetry::{transmit_backlog, BatchOptions, TransportMode};

#[derive(Debug)]
pub struct TelemeterArgs {
    pub file: Option<PathBuf>,
    pub stream: Option<String>,
    pub mode: Option<TransportMode>,
    pub file_limit: usize,
}

pub fn run(config: Config, args: TelemeterArgs) -> Result<ExitCode> {
    let telemetry = config.telemetry()?;
    let relay = config.relay()?;
    let mode = args.mode.unwrap_or(telemetry.mode);

    if let Some(file) = args.file {
        return match vigil_telemetry::deliver(&file, telemetry, relay, mode) {
            Ok(()) => {
                println!("delivered {}", file.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                error!(file = %file.display(), %err, "delivery failed");
                eprintln!("error: {err}");
                Ok(super::exit_from_status(err.exit_code()))
            }
        };
    }

    let options = BatchOptions {
        stream: args.stream,
        file_limit: args.file_limit,
    };
    match transmit_backlog(&config.data_root, telemetry, relay, mode, &options) {
        Ok(summary) => {
            println!(
                "delivered {}/{} staged files ({} failed)",
                summary.delivered, summary.attempted, summary.failed
            );
            if summary.failed == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Err(err) => {
            error!(%err, "transmit pass failed");
            eprintln!("error: {err}");
            Ok(super::exit_from_status(err.exit_code()))
        }
    }
}
