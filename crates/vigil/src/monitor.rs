//! The file pipeline monitor.
//!
//! A long-running loop over filesystem change notifications for every
//! `receive` and `transmit` directory under the data root. Receive arrivals
//! are classified and migrated into the stream's `ARCHIVE` tree, then staged
//! into the sibling `transmit` directory; transmit arrivals are handed to the
//! telemetry relay. Each event resolves to an [`EventOutcome`], and a single
//! cleanup step removes the receive-side source only after both the archive
//! and the staged copy are durably in place.
//!
//! Steady-state errors (malformed files, unreachable links) are logged and
//! absorbed; the loop only exits on shutdown or a broken watch channel.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use vigil_archive::{self as archive, DataFamily, MigrateContext, PlaceMode};

use crate::config::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Role of a watched directory within a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Receive,
    Transmit,
}

/// Resolution of one filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Receive arrival archived and staged for telemetry.
    Migrated { archived: PathBuf, staged: PathBuf },
    /// Transmit arrival shipped off-node.
    Delivered,
    /// Event did not qualify for the pipeline.
    Skipped(&'static str),
    /// Handler failed; the source file is retained for the next pass.
    Failed,
}

/// True for the two event kinds that mean "a complete file has arrived":
/// close-after-write, and rename into the watched directory.
pub fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

/// Dot-prefixed names are in-progress downloads and editor droppings.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true)
}

pub struct Monitor {
    config: Config,
    ctx: MigrateContext,
    roles: HashMap<PathBuf, Role>,
}

impl Monitor {
    /// Build the watch list from the configured streams and create any
    /// missing directories.
    pub fn new(config: Config) -> Result<Monitor> {
        if config.streams.is_empty() {
            bail!("no [[stream]] entries configured; nothing to monitor");
        }
        if !config.data_root.is_dir() {
            bail!("data_root does not exist: {}", config.data_root.display());
        }

        let mut roles = HashMap::new();
        for stream in &config.streams {
            let root = config.data_root.join(&stream.name);
            let mut pairs = vec![root.clone()];
            if stream.soh {
                pairs.push(root.join("SOH"));
            }
            for base in pairs {
                for (dir, role) in [("receive", Role::Receive), ("transmit", Role::Transmit)] {
                    let path = base.join(dir);
                    fs::create_dir_all(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let path = fs::canonicalize(&path)?;
                    roles.insert(path, role);
                }
            }
        }

        let ctx = config.migrate_context(false);
        Ok(Monitor { config, ctx, roles })
    }

    /// Watch until `shutdown` is set.
    pub fn run(&self, shutdown: Arc<AtomicBool>) -> Result<()> {
        let dirs: Vec<PathBuf> = self.roles.keys().cloned().collect();
        info!(dirs = dirs.len(), root = %self.config.data_root.display(), "monitor starting");
        event_loop(&dirs, &shutdown, |path, kind| {
            let outcome = self.handle_event(path, kind);
            debug!(path = %path.display(), ?outcome, "event handled");
        })?;
        info!("monitor stopped");
        Ok(())
    }

    /// Drive one event through the pipeline state machine.
    pub fn handle_event(&self, path: &Path, kind: &EventKind) -> EventOutcome {
        if !is_arrival(kind) {
            return EventOutcome::Skipped("not an arrival event");
        }
        if is_hidden(path) {
            return EventOutcome::Skipped("hidden file");
        }
        let Some(dir) = path.parent() else {
            return EventOutcome::Skipped("no parent directory");
        };
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let Some(role) = self.roles.get(&dir) else {
            return EventOutcome::Skipped("unwatched directory");
        };

        let outcome = match role {
            Role::Receive => self.handle_receive(path, &dir),
            Role::Transmit => self.handle_transmit(path),
        };

        // Single cleanup step: the receive source goes only once the archive
        // and the staged copy both exist.
        if let EventOutcome::Migrated { staged, .. } = &outcome {
            info!(file = %path.display(), staged = %staged.display(), "migrated");
            if let Err(err) = fs::remove_file(path) {
                warn!(file = %path.display(), %err, "failed to remove migrated source");
            }
        }
        outcome
    }

    fn handle_receive(&self, file: &Path, receive_dir: &Path) -> EventOutcome {
        let Some(family) = DataFamily::identify(file) else {
            debug!(file = %file.display(), "unrecognized format, leaving in place");
            return EventOutcome::Skipped("unrecognized format");
        };

        let archived = match archive::migrate(file, &archive_root_for(receive_dir), family, &self.ctx)
        {
            Ok(path) => path,
            Err(err) => {
                warn!(file = %file.display(), %err, "migration failed, source retained");
                return EventOutcome::Failed;
            }
        };

        // Stage a copy into the sibling transmit directory for the relay.
        let staged = receive_dir
            .parent()
            .unwrap_or(receive_dir)
            .join("transmit")
            .join(file.file_name().unwrap_or_default());
        if let Err(err) = archive::place(file, &staged, PlaceMode::Copy) {
            warn!(file = %file.display(), %err, "staging failed, source retained");
            return EventOutcome::Failed;
        }

        EventOutcome::Migrated { archived, staged }
    }

    fn handle_transmit(&self, file: &Path) -> EventOutcome {
        let (telemetry, relay) = match (self.config.telemetry(), self.config.relay()) {
            (Ok(t), Ok(r)) => (t, r),
            _ => {
                warn!("telemetry not configured, leaving staged file in place");
                return EventOutcome::Skipped("telemetry not configured");
            }
        };
        match vigil_telemetry::deliver(file, telemetry, relay, telemetry.mode) {
            Ok(()) => EventOutcome::Delivered,
            Err(err) => {
                warn!(file = %file.display(), %err, "delivery failed, leaving staged");
                EventOutcome::Failed
            }
        }
    }
}

/// The `ARCHIVE` tree owning a receive directory. An `SOH/receive` pair
/// shares its parent stream's archive.
fn archive_root_for(receive_dir: &Path) -> PathBuf {
    let mut stream_root = receive_dir.parent().unwrap_or(receive_dir);
    if stream_root.file_name().and_then(|n| n.to_str()) == Some("SOH") {
        stream_root = stream_root.parent().unwrap_or(stream_root);
    }
    stream_root.join("ARCHIVE")
}

/// Hub-side migration daemon: watch upload directories and re-file every
/// arrival into a shared archive, nesting each family under its own prefix.
/// Sources are deleted only on migrator success.
pub fn run_migrate(
    archive_root: &Path,
    watch_dirs: &[PathBuf],
    ctx: &MigrateContext,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    for dir in watch_dirs {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    info!(dirs = watch_dirs.len(), archive = %archive_root.display(), "migration daemon starting");
    event_loop(watch_dirs, &shutdown, |path, kind| {
        if !is_arrival(kind) || is_hidden(path) {
            return;
        }
        let Some(family) = DataFamily::identify(path) else {
            debug!(file = %path.display(), "unrecognized format, leaving in place");
            return;
        };
        match archive::migrate(path, archive_root, family, ctx) {
            Ok(dest) => {
                info!(file = %path.display(), dest = %dest.display(), "migrated");
                if let Err(err) = fs::remove_file(path) {
                    warn!(file = %path.display(), %err, "failed to remove migrated source");
                }
            }
            Err(err) => warn!(file = %path.display(), %err, "migration failed, source retained"),
        }
    })?;
    info!("migration daemon stopped");
    Ok(())
}

/// Blocking notify loop shared by the monitor and the migration daemon.
///
/// Events are handled strictly in delivery order on this thread; the
/// shutdown flag is polled between receives.
fn event_loop<F>(dirs: &[PathBuf], shutdown: &AtomicBool, mut handle: F) -> Result<()>
where
    F: FnMut(&Path, &EventKind),
{
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |event| {
        // Receiver hangup just ends the loop.
        let _ = tx.send(event);
    })
    .context("failed to create filesystem watcher")?;

    for dir in dirs {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;
    }

    while !shutdown.load(Ordering::Relaxed) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                for path in &event.paths {
                    handle(path, &event.kind);
                }
            }
            Ok(Err(err)) => warn!(%err, "filesystem watch error"),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
