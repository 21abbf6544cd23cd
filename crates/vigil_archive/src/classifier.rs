//! Pure, side-effect-free identification of instrument data files.
//!
//! The set of recognized families is fixed and small. An unrecognized name
//! is a skip, not an error: the file is left untouched for manual
//! inspection.

use std::path::Path;

/// The data families the node knows how to archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFamily {
    /// Septentrio binary format from a GNSS receiver (`.sbf`).
    Gnss,
    /// miniSEED waveform data from a seismometer or magnetometer
    /// (`.m`, `.mseed`, `.msd`).
    Seismic,
    /// JPEG/PNG stills from a visible or infrared camera.
    Imagery,
    /// Vaisala CO2 soil-probe CSV, identified by the `CO2.csv` naming
    /// convention rather than its extension.
    GasProbe,
}

impl DataFamily {
    /// Inspect a file's name/extension to select a migrator, or `None` if
    /// the file is unrecognized.
    pub fn identify(path: &Path) -> Option<DataFamily> {
        let name = path.file_name()?.to_str()?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "jpg" | "jpeg" | "png" => Some(DataFamily::Imagery),
            "sbf" => Some(DataFamily::Gnss),
            "m" | "mseed" | "msd" => Some(DataFamily::Seismic),
            _ if name.contains("CO2.csv") => Some(DataFamily::GasProbe),
            _ => None,
        }
    }

    /// Archive subtree used when migrating on the hub side, where each
    /// family is nested under its own prefix.
    pub fn family_dir(&self) -> &'static str {
        match self {
            DataFamily::Gnss => "gnss",
            DataFamily::Seismic => "miniseed",
            DataFamily::Imagery => "imagery",
            DataFamily::GasProbe => "soil-probe",
        }
    }
}

/// Image modality, decided by the name of the stream directory the file
/// arrived under (`<root>/infrared/receive/...` vs `<root>/visible/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Infrared,
    Visible,
}

impl Modality {
    /// Resolve the modality from the grandparent directory of `path`.
    pub fn from_path(path: &Path) -> Option<Modality> {
        let stream_dir = path.parent()?.parent()?.file_name()?.to_str()?;
        match stream_dir {
            "infrared" => Some(Modality::Infrared),
            "visible" => Some(Modality::Visible),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Infrared => "infrared",
            Modality::Visible => "visible",
        }
    }
}
