//! `vigil data-query`: fetch the latest window from an instrument.
//!
//! Fetched files land in the stream's `receive` directory, where a running
//! monitor treats them like any other arrival. "No data" is a normal
//! outcome with exit 0.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use tracing::error;

use vigil::config::{Config, DataKind, StreamConfig};
use vigil_telemetry::query::{self, window_start_end, QueryOutcome};
use vigil_telemetry::FdsnInstrumentConfig;

pub fn run(config: Config, instrument: &str) -> Result<ExitCode> {
    let now = chrono::Local::now().naive_local();
    match instrument {
        "gnss" => {
            let cfg = config
                .instruments
                .gnss
                .as_ref()
                .context("config has no [instruments.gnss] section")?;
            let stream = config
                .stream_of_kind(DataKind::Gnss)
                .context("no gnss stream configured")?;
            let receive = receive_dir(&config, stream, false);

            // The receiver closes its hourly file at the top of the hour;
            // ask for the last complete one.
            let start = now - Duration::hours(1);
            match query::query_gnss(cfg, &receive, start) {
                Ok(QueryOutcome::Retrieved(path)) => {
                    println!("retrieved {}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                Ok(QueryOutcome::NoData) => {
                    println!("no data for the requested window");
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    error!(%err, "gnss query failed");
                    eprintln!("error: {err}");
                    Ok(super::exit_from_status(err.exit_code()))
                }
            }
        }
        "seismic" | "magnetic" => {
            let (cfg, kind) = match instrument {
                "seismic" => (config.instruments.seismic.as_ref(), DataKind::Seismic),
                _ => (config.instruments.magnetic.as_ref(), DataKind::Magnetic),
            };
            let cfg =
                cfg.with_context(|| format!("config has no [instruments.{instrument}] section"))?;
            let stream = config
                .stream_of_kind(kind)
                .with_context(|| format!("no {instrument} stream configured"))?;
            run_fdsn(&config, stream, cfg, now)
        }
        other => bail!("unknown instrument '{other}' (expected gnss, seismic or magnetic)"),
    }
}

fn receive_dir(config: &Config, stream: &StreamConfig, soh: bool) -> PathBuf {
    let root = config.data_root.join(&stream.name);
    if soh {
        root.join("SOH/receive")
    } else {
        root.join("receive")
    }
}

fn run_fdsn(
    config: &Config,
    stream: &StreamConfig,
    cfg: &FdsnInstrumentConfig,
    now: chrono::NaiveDateTime,
) -> Result<ExitCode> {
    let (start, end) = window_start_end(now, cfg.timestep_minutes);
    let mut retrieved = 0usize;
    let mut failed = 0usize;

    let requests = cfg
        .channels
        .iter()
        .map(|c| (c, false))
        .chain(cfg.soh_channels.iter().map(|c| (c, true)));
    for (channel, soh) in requests {
        let receive = receive_dir(config, stream, soh && stream.soh);
        match query::query_fdsnws(cfg, channel, "D", start, end, &receive) {
            Ok(QueryOutcome::Retrieved(path)) => {
                println!("retrieved {}", path.display());
                retrieved += 1;
            }
            Ok(QueryOutcome::NoData) => println!("{channel}: no data for the requested window"),
            Err(err) => {
                error!(channel, %err, "query failed");
                eprintln!("error: {channel}: {err}");
                failed += 1;
            }
        }
    }

    println!("retrieved {retrieved} files ({failed} failed)");
    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
