//! Durable placement of files into the archive tree.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ArchiveError, Result};

/// How a source file lands at its archive destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceMode {
    /// Checksum-aware synchronization of the whole file; safe to re-run.
    Copy,
    /// Raw append onto an existing daily file (merge-capable migrators
    /// only).
    Append,
}

/// Place `source` at `destination`, creating parent directories first.
pub fn place(source: &Path, destination: &Path, mode: PlaceMode) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    match mode {
        PlaceMode::Copy => copy(source, destination),
        PlaceMode::Append => append(source, destination),
    }
}

fn copy(source: &Path, destination: &Path) -> Result<()> {
    let code = vigil_exec::rsync_archive(source, destination, vigil_exec::DEFAULT_MAX_ATTEMPTS);
    match code {
        0 => {
            debug!(destination = %destination.display(), "archive copy complete");
            Ok(())
        }
        // rsync missing on this host: a plain copy still satisfies the
        // durability contract, just without resume tolerance.
        vigil_exec::SPAWN_FAILED => {
            warn!("rsync unavailable, falling back to direct copy");
            fs::copy(source, destination)?;
            Ok(())
        }
        code => Err(ArchiveError::CopyFailed(code)),
    }
}

fn append(source: &Path, destination: &Path) -> Result<()> {
    let mut reader = fs::File::open(source)?;
    let mut writer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)?;
    io::copy(&mut reader, &mut writer)?;
    debug!(destination = %destination.display(), "appended to archive file");
    Ok(())
}
