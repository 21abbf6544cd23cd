//! Migration of miniSEED waveform files (seismic and magnetic streams).
//!
//! Query drivers name their output `network.station.location.channel.type.
//! year.julianday`, so the archive identity is re-derived from the filename
//! alone. Multiple retrieval windows per day land in the same daily file:
//! when the destination already exists the new records are appended rather
//! than the file overwritten. Redelivery of an already-covered window
//! therefore duplicates records; see DESIGN.md.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::writer::{self, PlaceMode};

const FIXED_HEADER_LEN: usize = 48;

/// Identity parsed from a dot-delimited miniSEED filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedId {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub year: i32,
    pub jday: u32,
}

impl SeedId {
    /// Parse `network.station.location.channel.type.year.julianday[.ext]`.
    pub fn parse(name: &str) -> Result<SeedId> {
        let fields: Vec<&str> = name.split('.').collect();
        if fields.len() < 7 {
            return Err(ArchiveError::filename(
                name,
                "expected network.station.location.channel.type.year.julianday",
            ));
        }

        let year: i32 = fields[5]
            .parse()
            .map_err(|_| ArchiveError::filename(name, "year field is not a number"))?;
        let jday: u32 = fields[6]
            .parse()
            .map_err(|_| ArchiveError::filename(name, "julian-day field is not a number"))?;
        if !(1..=366).contains(&jday) {
            return Err(ArchiveError::filename(name, "julian day out of range"));
        }

        Ok(SeedId {
            network: fields[0].to_string(),
            station: fields[1].to_string(),
            location: fields[2].to_string(),
            channel: fields[3].to_string(),
            year,
            jday,
        })
    }

    /// Archive subtree for this identity: `{year}/{network}/{station}/{channel}.D`.
    pub fn archive_dir(&self) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}/{}/{}.D",
            self.year, self.network, self.station, self.channel
        ))
    }

    /// Canonical daily filename:
    /// `{network}.{station}.{location}.{channel}.D.{year}.{jday:03d}`.
    pub fn archive_filename(&self) -> String {
        format!(
            "{}.{}.{}.{}.D.{}.{:03}",
            self.network, self.station, self.location, self.channel, self.year, self.jday
        )
    }
}

/// Reject files that do not start with a plausible miniSEED fixed header,
/// so nothing partial or corrupt lands in the archive tree.
fn check_fixed_header(file: &Path) -> Result<()> {
    let mut header = [0u8; FIXED_HEADER_LEN];
    let mut reader = fs::File::open(file)?;
    reader
        .read_exact(&mut header)
        .map_err(|_| ArchiveError::CorruptMiniseed("shorter than one fixed header".into()))?;

    let sequence_ok = header[..6]
        .iter()
        .all(|b| b.is_ascii_digit() || *b == b' ');
    let quality_ok = matches!(header[6], b'D' | b'R' | b'Q' | b'M');
    if !sequence_ok || !quality_ok || header[7] != b' ' {
        return Err(ArchiveError::CorruptMiniseed(
            "fixed header does not match miniSEED layout".into(),
        ));
    }
    Ok(())
}

/// Migrate a miniSEED file into the archive, appending when a daily file for
/// the same (network, station, channel, year, julian-day) already exists.
pub fn migrate(file: &Path, archive_root: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArchiveError::filename(file.display().to_string(), "not valid UTF-8"))?;

    let id = SeedId::parse(name)?;
    check_fixed_header(file)?;

    let destination = archive_root.join(id.archive_dir()).join(id.archive_filename());

    if destination.is_file() {
        debug!(file = %destination.display(), "data for this day already exists, appending");
        writer::place(file, &destination, PlaceMode::Append)?;
    } else {
        debug!(file = %destination.display(), "no file for this day yet, creating");
        writer::place(file, &destination, PlaceMode::Copy)?;
    }

    Ok(destination)
}
