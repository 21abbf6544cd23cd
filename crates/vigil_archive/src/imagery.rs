//! Migration of still imagery (visible and infrared cameras).
//!
//! Filenames are `vnum.station.year.julday_time-frame.ext`; the modality
//! (infrared vs visible) is carried by the stream directory the file
//! arrived under, not by the filename.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classifier::Modality;
use crate::error::{ArchiveError, Result};
use crate::writer::{self, PlaceMode};

/// Fields parsed from an imagery filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageId {
    pub vnum: String,
    pub station: String,
    pub year: String,
    pub jday: u32,
}

impl ImageId {
    /// Parse the leading `vnum.station.year.julday` of an imagery filename.
    pub fn parse(name: &str) -> Result<ImageId> {
        let head = name.split('_').next().unwrap_or_default();
        let fields: Vec<&str> = head.split('.').collect();
        if fields.len() != 4 {
            return Err(ArchiveError::filename(
                name,
                "expected vnum.station.year.julday_time-frame.ext",
            ));
        }
        let jday: u32 = fields[3]
            .parse()
            .map_err(|_| ArchiveError::filename(name, "julian-day field is not a number"))?;

        Ok(ImageId {
            vnum: fields[0].to_string(),
            station: fields[1].to_string(),
            year: fields[2].to_string(),
            jday,
        })
    }

    /// Archive subtree for this image (below the modality directory).
    pub fn archive_dir(&self) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}/{}/still/{:03}",
            self.vnum, self.year, self.station, self.jday
        ))
    }
}

/// Migrate a still image into the archive, split by modality.
pub fn migrate(file: &Path, archive_root: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArchiveError::filename(file.display().to_string(), "not valid UTF-8"))?;

    let modality = Modality::from_path(file)
        .ok_or_else(|| ArchiveError::UnknownModality(file.display().to_string()))?;
    let id = ImageId::parse(name)?;

    let destination = archive_root
        .join(modality.as_str())
        .join(id.archive_dir())
        .join(name);

    debug!(file = %destination.display(), "imagery archive destination");
    writer::place(file, &destination, PlaceMode::Copy)?;

    Ok(destination)
}
