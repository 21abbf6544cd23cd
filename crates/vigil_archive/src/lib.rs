//! Per-format archival classification and migration.
//!
//! Instrument drivers deposit freshly fetched files into a `receive`
//! directory; this crate decides what a file is ([`DataFamily::identify`])
//! and re-files it into the canonical archive layout ([`migrate`]). The
//! InstrumentFile -> archive path mapping is a pure function of the filename
//! plus a small config-provided lookup table, so re-migrating the same file
//! is idempotent and safe after a crash.
//!
//! Migrators never delete their source file; deletion belongs to the caller
//! and only after the migrator reports success.

pub mod base36;
pub mod classifier;
pub mod error;
pub mod gas;
pub mod gnss;
pub mod imagery;
pub mod seismic;
pub mod writer;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use classifier::{DataFamily, Modality};
pub use error::{ArchiveError, Result};
pub use writer::{place, PlaceMode};

/// Configuration-derived inputs shared by the migrators.
#[derive(Debug, Clone, Default)]
pub struct MigrateContext {
    /// GNSS receiver serial number -> station code.
    pub gnss_site_lookup: HashMap<u32, String>,
    /// Nest each family under its own archive prefix (hub-side migration).
    pub family_prefix: bool,
}

/// Migrate `file` into the archive rooted at `archive_root`.
///
/// Returns the archive destination on success. Errors are unrecoverable
/// format errors: the caller must retain the source for manual triage.
pub fn migrate(
    file: &Path,
    archive_root: &Path,
    family: DataFamily,
    ctx: &MigrateContext,
) -> Result<PathBuf> {
    let root = if ctx.family_prefix {
        archive_root.join(family.family_dir())
    } else {
        archive_root.to_path_buf()
    };

    match family {
        DataFamily::Gnss => gnss::migrate(file, &root, &ctx.gnss_site_lookup),
        DataFamily::Seismic => seismic::migrate(file, &root),
        DataFamily::Imagery => imagery::migrate(file, &root),
        DataFamily::GasProbe => gas::migrate(file, &root),
    }
}
