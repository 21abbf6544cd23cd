//! Batch transmission of the staged backlog.
//!
//! `vigil telemeter` without a file argument walks every stream's `transmit`
//! directory under the data root and delivers what it finds, oldest name
//! first. The transceiver is brought up once for the whole pass; per-file
//! failures are logged and counted but do not stop the pass.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{RelayConfig, TelemetryConfig, TransportMode};
use crate::deliver::{self, RelayLink};
use crate::error::Result;

pub const DEFAULT_FILE_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Restrict the pass to one stream directory.
    pub stream: Option<String>,
    /// Hard cap on files attempted in one pass.
    pub file_limit: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            stream: None,
            file_limit: DEFAULT_FILE_LIMIT,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true)
}

fn push_staged(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && !is_hidden(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Every staged file under `data_root`, sorted by path.
///
/// Each stream contributes `<stream>/transmit` and, for streams keeping
/// state-of-health records, `<stream>/SOH/transmit`.
pub fn collect_staged(data_root: &Path, stream: Option<&str>) -> std::io::Result<Vec<PathBuf>> {
    let mut staged = Vec::new();
    for entry in fs::read_dir(data_root)? {
        let stream_dir = entry?.path();
        if !stream_dir.is_dir() || is_hidden(&stream_dir) {
            continue;
        }
        if let Some(wanted) = stream {
            if stream_dir.file_name().and_then(|n| n.to_str()) != Some(wanted) {
                continue;
            }
        }
        push_staged(&stream_dir.join("transmit"), &mut staged)?;
        push_staged(&stream_dir.join("SOH/transmit"), &mut staged)?;
    }
    staged.sort();
    Ok(staged)
}

/// Deliver the staged backlog under `data_root`.
pub fn transmit_backlog(
    data_root: &Path,
    telemetry: &TelemetryConfig,
    relay: &RelayConfig,
    mode: TransportMode,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let staged = collect_staged(data_root, options.stream.as_deref())?;
    if staged.is_empty() {
        info!("no staged files to transmit");
        return Ok(BatchSummary::default());
    }

    let link = RelayLink { relay };
    deliver::ensure_transceiver(&link, telemetry, relay.channel_for(mode))?;

    let mut summary = BatchSummary::default();
    for file in staged.iter().take(options.file_limit) {
        summary.attempted += 1;
        match deliver::deliver_file(file, telemetry, mode) {
            Ok(()) => summary.delivered += 1,
            Err(err) => {
                warn!(file = %file.display(), %err, "delivery failed, leaving staged");
                summary.failed += 1;
            }
        }
    }

    info!(
        attempted = summary.attempted,
        delivered = summary.delivered,
        failed = summary.failed,
        "transmit pass complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn collects_transmit_and_soh_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("seismic-a/transmit/b.msd"));
        touch(&root.join("seismic-a/transmit/a.msd"));
        touch(&root.join("seismic-a/SOH/transmit/soh.msd"));
        touch(&root.join("gnss-a/transmit/c.sbf"));
        // Not staged: still in receive, or hidden.
        touch(&root.join("gnss-a/receive/d.sbf"));
        touch(&root.join("seismic-a/transmit/.partial"));

        let staged = collect_staged(root, None).unwrap();
        assert_eq!(
            staged,
            vec![
                root.join("gnss-a/transmit/c.sbf"),
                root.join("seismic-a/SOH/transmit/soh.msd"),
                root.join("seismic-a/transmit/a.msd"),
                root.join("seismic-a/transmit/b.msd"),
            ]
        );
    }

    #[test]
    fn stream_filter_narrows_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("gnss-a/transmit/a.sbf"));
        touch(&root.join("seismic-a/transmit/b.msd"));

        let staged = collect_staged(root, Some("gnss-a")).unwrap();
        assert_eq!(staged, vec![root.join("gnss-a/transmit/a.sbf")]);
    }

    #[test]
    fn empty_data_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_staged(dir.path(), None).unwrap().is_empty());
    }
}
