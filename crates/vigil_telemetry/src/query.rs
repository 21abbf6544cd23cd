//! On-demand retrieval of data from the node's instruments.
//!
//! Drivers fetch a time window of data over HTTP and drop the result into
//! the stream's `receive` directory, where the pipeline monitor picks it up
//! like any other arrival. Downloads land under a dot-prefixed temp name and
//! are renamed into place only when complete, so the monitor never sees a
//! partial file.
//!
//! "No data for this window" is a normal outcome, not an error: an
//! instrument that was asleep or had nothing to report answers with an
//! empty body.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use tracing::{debug, info};

use vigil_archive::gnss::{GnssStem, StreamSelector};

use crate::config::{FdsnInstrumentConfig, GnssInstrumentConfig};
use crate::error::{Result, TelemetryError};

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Data fetched and placed in the receive directory.
    Retrieved(PathBuf),
    /// The instrument answered but had nothing for this window.
    NoData,
}

/// The most recent complete request window ending at or before `now`.
///
/// Windows are aligned to multiples of `timestep_minutes` within the hour,
/// so repeated invocations ask for stable, non-overlapping ranges.
pub fn window_start_end(now: NaiveDateTime, timestep_minutes: i64) -> (NaiveDateTime, NaiveDateTime) {
    let aligned_minute = (now.minute() as i64 / timestep_minutes) * timestep_minutes;
    let end = now
        .with_minute(aligned_minute as u32)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    (end - Duration::minutes(timestep_minutes), end)
}

fn download(url: &str, receive_dir: &Path, filename: &str) -> Result<QueryOutcome> {
    fs::create_dir_all(receive_dir)?;
    let partial = receive_dir.join(format!(".{filename}.part"));

    let mut command = Command::new("curl");
    command
        .args(["-s", "-S", "--fail", "-o"])
        .arg(&partial)
        .arg(url)
        .stdout(Stdio::null());
    let code = vigil_exec::run_with_retry(&mut command, vigil_exec::DEFAULT_MAX_ATTEMPTS);

    if code != 0 {
        if partial.exists() {
            fs::remove_file(&partial)?;
        }
        return Err(TelemetryError::QueryFailed(code));
    }

    // curl exits 0 with an empty body when the instrument has no data.
    if partial.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        if partial.exists() {
            fs::remove_file(&partial)?;
        }
        debug!(url, "instrument reported no data for window");
        return Ok(QueryOutcome::NoData);
    }

    let destination = receive_dir.join(filename);
    fs::rename(&partial, &destination)?;
    info!(file = %destination.display(), "retrieved");
    Ok(QueryOutcome::Retrieved(destination))
}

/// The receiver-side path and local filename for one hourly GNSS file.
pub fn gnss_request(cfg: &GnssInstrumentConfig, start: NaiveDateTime) -> Result<(String, String)> {
    let selector = cfg
        .filestream
        .chars()
        .next()
        .ok_or_else(|| TelemetryError::Config("empty instruments.gnss.filestream".into()))?;
    let stem = GnssStem {
        serial: cfg.serial_number,
        stream: StreamSelector::from_char(selector)?,
        year: (start.year() - 2000).max(0) as u32,
        month: start.month(),
        day: start.day(),
        hour: start.hour(),
    };
    let url = format!(
        "http://{}:{}/download/{}",
        cfg.ip,
        cfg.port,
        stem.query_filename()?
    );
    Ok((url, format!("{}.sbf", stem.encode())))
}

/// Fetch the hourly GNSS file covering `start` into `receive_dir`.
pub fn query_gnss(
    cfg: &GnssInstrumentConfig,
    receive_dir: &Path,
    start: NaiveDateTime,
) -> Result<QueryOutcome> {
    if vigil_exec::ping(&cfg.ip, vigil_exec::DEFAULT_MAX_ATTEMPTS) != 0 {
        return Err(TelemetryError::InstrumentUnreachable(cfg.ip.clone()));
    }
    let (url, filename) = gnss_request(cfg, start)?;
    download(&url, receive_dir, &filename)
}

/// The dataselect URL and local filename for one FDSN web-service request.
///
/// An empty configured location code means "any" in the request and an
/// empty field in the filename.
pub fn fdsn_request(
    cfg: &FdsnInstrumentConfig,
    channel: &str,
    stream_type: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> (String, String) {
    let location_query = if cfg.location.is_empty() {
        "*"
    } else {
        &cfg.location
    };
    let url = format!(
        "http://{}/fdsnws/dataselect/1/query?network={}&station={}&location={}&channel={}&starttime={}&endtime={}",
        cfg.ip,
        cfg.network,
        cfg.station,
        location_query,
        channel,
        start.format("%Y-%m-%dT%H:%M:%S"),
        end.format("%Y-%m-%dT%H:%M:%S"),
    );
    // The .m suffix marks the file as miniSEED for the classifier.
    let filename = format!(
        "{}.{}.{}.{}.{}.{}.{:03}.m",
        cfg.network,
        cfg.station,
        cfg.location,
        channel,
        stream_type,
        start.year(),
        start.ordinal(),
    );
    (url, filename)
}

/// Fetch one channel's window from an FDSN-speaking digitizer.
pub fn query_fdsnws(
    cfg: &FdsnInstrumentConfig,
    channel: &str,
    stream_type: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    receive_dir: &Path,
) -> Result<QueryOutcome> {
    if vigil_exec::ping(&cfg.ip, vigil_exec::DEFAULT_MAX_ATTEMPTS) != 0 {
        return Err(TelemetryError::InstrumentUnreachable(cfg.ip.clone()));
    }
    let (url, filename) = fdsn_request(cfg, channel, stream_type, start, end);
    download(&url, receive_dir, &filename)
}
