//! Migration of CO2 soil-probe CSV records.
//!
//! Each input file holds exactly one header line and one data line. The
//! day's archive file is created with the header the first time a record
//! for that (station, year, julian-day) arrives; every call appends the
//! data line. Redelivering the same record appends it again; see DESIGN.md.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ArchiveError, Result};

/// Migrate a gas-probe CSV file into the daily archive file.
pub fn migrate(file: &Path, archive_root: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArchiveError::filename(file.display().to_string(), "not valid UTF-8"))?;

    let mut fields = name.split('.');
    let (station, year, jday) = match (fields.next(), fields.next(), fields.next()) {
        (Some(station), Some(year), Some(jday)) => (station, year, jday),
        _ => {
            return Err(ArchiveError::filename(
                name,
                "expected station.year.julday....CO2.csv",
            ))
        }
    };
    let jday: u32 = jday
        .parse()
        .map_err(|_| ArchiveError::filename(name, "julian-day field is not a number"))?;

    let contents = fs::read_to_string(file)?;
    let mut lines = contents.lines();
    let (header, data) = match (lines.next(), lines.next()) {
        (Some(header), Some(data)) => (header, data),
        _ => return Err(ArchiveError::TruncatedGasFile(name.to_string())),
    };

    let destination = archive_root
        .join(format!("{year}/{station}"))
        .join(format!("{station}.{year}.{jday:03}.CO2.csv"));

    if !destination.is_file() {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(file = %destination.display(), "creating daily gas file with header");
        fs::write(&destination, format!("{header}\n"))?;
    }

    let mut writer = OpenOptions::new().append(true).open(&destination)?;
    writeln!(writer, "{data}")?;
    debug!(file = %destination.display(), "appended gas record");

    Ok(destination)
}
