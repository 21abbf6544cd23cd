//! Typed node configuration.
//!
//! The whole configuration is resolved and validated once at startup from an
//! explicit `--config` path. Sections a command does not need may be absent;
//! asking for a missing section is a fatal error at the point of use, never
//! a silent default. No credential has a compiled-in fallback.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use vigil_archive::MigrateContext;
use vigil_telemetry::{FdsnInstrumentConfig, GnssInstrumentConfig, RelayConfig, TelemetryConfig};

/// Data family a stream carries, as declared in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataKind {
    Gnss,
    Seismic,
    Magnetic,
    Imagery,
    Gas,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Gnss => "gnss",
            DataKind::Seismic => "seismic",
            DataKind::Magnetic => "magnetic",
            DataKind::Imagery => "imagery",
            DataKind::Gas => "gas",
        }
    }
}

/// One `[[stream]]` entry: a directory under the data root.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Directory name under `data_root`.
    pub name: String,
    pub kind: DataKind,
    /// Adds an `SOH/receive` + `SOH/transmit` pair for state-of-health logs.
    #[serde(default)]
    pub soh: bool,
}

/// `[instruments]` table: per-family acquisition settings for data-query.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentsConfig {
    pub gnss: Option<GnssInstrumentConfig>,
    pub seismic: Option<FdsnInstrumentConfig>,
    pub magnetic: Option<FdsnInstrumentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root of the per-stream receive/transmit/ARCHIVE layout.
    pub data_root: PathBuf,

    #[serde(rename = "stream", default)]
    pub streams: Vec<StreamConfig>,

    pub telemetry: Option<TelemetryConfig>,
    pub relay: Option<RelayConfig>,

    /// GNSS receiver serial number (decimal, as a TOML key) -> station code.
    #[serde(default)]
    pub gnss_site_lookup: HashMap<String, String>,

    #[serde(default)]
    pub instruments: InstrumentsConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (serial, station) in &self.gnss_site_lookup {
            serial.parse::<u32>().ok().with_context(|| {
                format!("gnss_site_lookup key '{serial}' is not a receiver serial number")
            })?;
            if station.is_empty() {
                bail!("gnss_site_lookup entry for serial {serial} has an empty station code");
            }
        }
        if let Some(relay) = &self.relay {
            relay.validate()?;
        }
        for instrument in [&self.instruments.seismic, &self.instruments.magnetic] {
            if let Some(cfg) = instrument {
                cfg.validate()?;
            }
        }
        Ok(())
    }

    /// The `[telemetry]` section, required by delivery commands.
    pub fn telemetry(&self) -> Result<&TelemetryConfig> {
        self.telemetry
            .as_ref()
            .context("config has no [telemetry] section")
    }

    /// The `[relay]` section, required by delivery and toggle-relay.
    pub fn relay(&self) -> Result<&RelayConfig> {
        self.relay.as_ref().context("config has no [relay] section")
    }

    /// The first configured stream carrying `kind`, if any.
    pub fn stream_of_kind(&self, kind: DataKind) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.kind == kind)
    }

    /// The serial -> station table with keys parsed. Keys were validated at
    /// load time.
    pub fn site_lookup(&self) -> HashMap<u32, String> {
        self.gnss_site_lookup
            .iter()
            .filter_map(|(serial, station)| {
                serial.parse().ok().map(|serial| (serial, station.clone()))
            })
            .collect()
    }

    pub fn migrate_context(&self, family_prefix: bool) -> MigrateContext {
        MigrateContext {
            gnss_site_lookup: self.site_lookup(),
            family_prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        data_root = "/data"

        [[stream]]
        name = "seismic-a"
        kind = "seismic"
        soh = true

        [[stream]]
        name = "gnss-a"
        kind = "gnss"

        [telemetry]
        mode = "lan"
        transceiver_ip = "192.168.0.30"
        target_ip = "192.168.1.2"
        lan_user = "vigil"

        [relay]
        ip = "192.168.0.40"
        username = "admin"
        password = "hunter2"
        lan_channel = 1
        long_haul_channel = 2

        [gnss_site_lookup]
        10 = "STA1"

        [instruments.seismic]
        ip = "192.168.0.60"
        network = "AV"
        station = "STA2"
        channels = ["HHZ", "HHN", "HHE"]
        soh_channels = ["VEC"]
    "#;

    fn load(contents: &str) -> Result<Config> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        Config::load(&path)
    }

    #[test]
    fn full_example_parses_and_validates() {
        let config = load(EXAMPLE).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/data"));
        assert_eq!(config.streams.len(), 2);
        assert!(config.streams[0].soh);
        assert!(!config.streams[1].soh);
        assert_eq!(config.site_lookup().get(&10).map(String::as_str), Some("STA1"));
        assert_eq!(
            config.stream_of_kind(DataKind::Gnss).map(|s| s.name.as_str()),
            Some("gnss-a")
        );
        let seismic = config.instruments.seismic.as_ref().unwrap();
        assert_eq!(seismic.timestep_minutes, 10);
        assert_eq!(seismic.location, "");
    }

    #[test]
    fn minimal_config_leaves_sections_absent() {
        let config = load("data_root = \"/data\"\n").unwrap();
        assert!(config.telemetry().is_err());
        assert!(config.relay().is_err());
        assert!(config.streams.is_empty());
    }

    #[test]
    fn non_numeric_serial_key_is_rejected() {
        let err = load("data_root = \"/d\"\n[gnss_site_lookup]\nABC = \"STA1\"\n").unwrap_err();
        assert!(err.to_string().contains("serial"));
    }

    #[test]
    fn zero_timestep_instrument_is_rejected_at_load() {
        let contents = r#"
            data_root = "/d"
            [instruments.seismic]
            ip = "192.168.0.60"
            network = "AV"
            station = "STA2"
            channels = ["HHZ"]
            timestep_minutes = 0
        "#;
        let err = load(contents).unwrap_err();
        assert!(err.to_string().contains("timestep"));
    }

    #[test]
    fn out_of_range_relay_channel_is_rejected() {
        let contents = r#"
            data_root = "/d"
            [relay]
            ip = "192.168.0.40"
            username = "u"
            password = "p"
            lan_channel = 0
            long_haul_channel = 2
        "#;
        assert!(load(contents).is_err());
    }
}
