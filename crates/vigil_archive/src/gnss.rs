//! Migration of GNSS receiver files (Septentrio binary format).
//!
//! Receiver filenames pack their metadata into an 8-character base-36 stem:
//!
//! ```text
//! SSFYYMDH.sbf
//!   SS = receiver serial number    F = stream selector
//!   YY = 2-digit year              M = month
//!   D  = day                       H = hour
//! ```
//!
//! The serial number is mapped to a station code through a config-provided
//! lookup table, and the archive path depends on the stream selector.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::base36;
use crate::error::{ArchiveError, Result};
use crate::writer::{self, PlaceMode};

/// Which onboard data channel a GNSS file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSelector {
    /// Standard 30-second observation stream.
    Raw,
    /// 1 Hz high-rate stream.
    HighRate,
    /// Navigation file.
    Navigation,
    /// Receiver status file.
    Status,
}

impl StreamSelector {
    pub fn from_char(ch: char) -> Result<StreamSelector> {
        match ch {
            '1' => Ok(StreamSelector::Raw),
            '2' => Ok(StreamSelector::HighRate),
            '3' => Ok(StreamSelector::Navigation),
            '4' => Ok(StreamSelector::Status),
            other => Err(ArchiveError::UnknownStream(other)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            StreamSelector::Raw => '1',
            StreamSelector::HighRate => '2',
            StreamSelector::Navigation => '3',
            StreamSelector::Status => '4',
        }
    }
}

/// Decoded identity of a GNSS receiver file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnssStem {
    pub serial: u32,
    pub stream: StreamSelector,
    /// Two-digit year (0-99), interpreted as 2000 + year.
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl GnssStem {
    /// Decode an 8-character base-36 stem.
    pub fn decode(stem: &str) -> Result<GnssStem> {
        if !stem.is_ascii() || stem.len() != 8 {
            return Err(ArchiveError::filename(
                stem,
                "GNSS stem must be 8 base-36 characters",
            ));
        }

        let field = |range: std::ops::Range<usize>, what: &str| -> Result<u32> {
            base36::decode(&stem[range])
                .ok_or_else(|| ArchiveError::filename(stem, format!("invalid base-36 {what}")))
        };

        let serial = field(0..2, "serial number")?;
        let stream = StreamSelector::from_char(stem.as_bytes()[2] as char)?;
        let year = field(3..5, "year")?;
        let month = field(5..6, "month")?;
        let day = field(6..7, "day")?;
        let hour = field(7..8, "hour")?;

        let decoded = GnssStem {
            serial,
            stream,
            year,
            month,
            day,
            hour,
        };
        decoded.date()?;
        if decoded.year > 99 || decoded.hour > 23 {
            return Err(ArchiveError::InvalidDate(stem.to_string()));
        }
        Ok(decoded)
    }

    /// Encode back to the receiver's 8-character stem.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            base36::encode_width(self.serial, 2),
            self.stream.as_char(),
            base36::encode_width(self.year, 2),
            base36::encode(self.month),
            base36::encode(self.day),
            base36::encode(self.hour),
        )
    }

    /// Calendar date encoded in the stem.
    pub fn date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(2000 + self.year as i32, self.month, self.day)
            .ok_or_else(|| ArchiveError::InvalidDate(self.encode()))
    }

    /// The on-wire path used to fetch this file from the receiver:
    /// `{yy}{jday:03d}/{stem}.sbf`.
    pub fn query_filename(&self) -> Result<String> {
        let date = self.date()?;
        Ok(format!(
            "{:02}{:03}/{}.sbf",
            self.year,
            date.ordinal(),
            self.encode()
        ))
    }
}

/// Migrate a `.sbf` file into the canonical archive layout.
///
/// Returns the archive destination path. The source file is never deleted
/// here; that is the caller's responsibility after success.
pub fn migrate(
    file: &Path,
    archive_root: &Path,
    site_lookup: &HashMap<u32, String>,
) -> Result<PathBuf> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ArchiveError::filename(file.display().to_string(), "not valid UTF-8"))?;
    let decoded = GnssStem::decode(stem)?;

    let station = site_lookup
        .get(&decoded.serial)
        .ok_or(ArchiveError::UnknownSerial(decoded.serial))?;

    let date = decoded.date()?;
    let year = date.year();
    let jday = date.ordinal();
    let hour = decoded.hour;

    let outfile = match decoded.stream {
        StreamSelector::Raw => archive_root
            .join(format!("raw/{year}/{jday:03}/{station}"))
            .join(format!(
                "{station}00US_R_{year}{jday:03}{hour:02}00_01D_30S_MO.sbf"
            )),
        StreamSelector::HighRate => archive_root
            .join(format!("highrate/1-Hz/raw/{year}/{jday:03}/{station}"))
            .join(format!(
                "{station}00US_R_{year}{jday:03}{hour:02}00_01H_01Z_MO.sbf"
            )),
        StreamSelector::Navigation => archive_root
            .join(format!("raw/{year}/{jday:03}/{station}"))
            .join(format!(
                "{station}00US_R_{year}{jday:03}{hour:02}00_01D_MN.sbf"
            )),
        StreamSelector::Status => {
            let name = file.file_name().unwrap_or_default();
            archive_root
                .join(format!("status/raw/{year}/{jday:03}/{station}"))
                .join(name)
        }
    };

    debug!(file = %outfile.display(), "GNSS archive destination");
    writer::place(file, &outfile, PlaceMode::Copy)?;

    Ok(outfile)
}
