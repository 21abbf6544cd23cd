//! Telemetry, relay, and instrument configuration sections.
//!
//! These are typed views of the node's TOML configuration. No credential or
//! address has a compiled-in default; anything a transport needs must come
//! from the file, and a missing value is a configuration error at the point
//! of use.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// How data leaves the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// Radio LAN: rsync to a hub on the local network.
    Lan,
    /// Satellite/cellular: authenticated HTTP upload to a remote server.
    LongHaul,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Lan => "lan",
            TransportMode::LongHaul => "long-haul",
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lan" => Ok(TransportMode::Lan),
            "long-haul" => Ok(TransportMode::LongHaul),
            other => Err(format!("unknown transport mode '{other}' (expected lan or long-haul)")),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default transport mode for this node.
    pub mode: TransportMode,
    /// Local radio or satellite modem address.
    pub transceiver_ip: String,
    /// Hub (LAN) or upload server (long-haul) address.
    pub target_ip: String,
    /// Upload server port (long-haul only).
    pub target_port: Option<u16>,
    /// Upload token (long-haul only).
    pub token: Option<String>,
    /// SSH user for LAN rsync transfers (lan only).
    pub lan_user: Option<String>,
}

impl TelemetryConfig {
    pub fn target_port(&self) -> Result<u16> {
        self.target_port
            .ok_or_else(|| TelemetryError::Config("missing telemetry.target_port".into()))
    }

    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| TelemetryError::Config("missing telemetry.token".into()))
    }

    pub fn lan_user(&self) -> Result<&str> {
        self.lan_user
            .as_deref()
            .ok_or_else(|| TelemetryError::Config("missing telemetry.lan_user".into()))
    }
}

/// `[relay]` section: the network-attached power relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    pub ip: String,
    pub username: String,
    pub password: String,
    /// Switch powering the radio transceiver.
    pub lan_channel: u8,
    /// Switch powering the satellite/cellular modem.
    pub long_haul_channel: u8,
}

impl RelayConfig {
    /// The relay switch mapped to the active transport mode.
    pub fn channel_for(&self, mode: TransportMode) -> u8 {
        match mode {
            TransportMode::Lan => self.lan_channel,
            TransportMode::LongHaul => self.long_haul_channel,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for channel in [self.lan_channel, self.long_haul_channel] {
            if !(1..=4).contains(&channel) {
                return Err(TelemetryError::Config(format!(
                    "relay channel {channel} out of range (1-4)"
                )));
            }
        }
        Ok(())
    }
}

/// `[instruments.gnss]` section (data-query).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GnssInstrumentConfig {
    pub ip: String,
    pub port: u16,
    pub serial_number: u32,
    /// Stream selector to request, e.g. "1" for the standard stream.
    pub filestream: String,
}

fn default_timestep() -> i64 {
    10
}

/// `[instruments.seismic]` / `[instruments.magnetic]` section (data-query).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FdsnInstrumentConfig {
    pub ip: String,
    pub network: String,
    pub station: String,
    #[serde(default)]
    pub location: String,
    pub channels: Vec<String>,
    #[serde(default)]
    pub soh_channels: Vec<String>,
    /// Size of the request window, in minutes.
    #[serde(default = "default_timestep")]
    pub timestep_minutes: i64,
}

impl FdsnInstrumentConfig {
    /// Window alignment divides by the timestep, so it must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.timestep_minutes < 1 {
            return Err(TelemetryError::Config(format!(
                "timestep_minutes must be at least 1, got {}",
                self.timestep_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_mode_parses_from_cli_strings() {
        assert_eq!("lan".parse::<TransportMode>().unwrap(), TransportMode::Lan);
        assert_eq!(
            "long-haul".parse::<TransportMode>().unwrap(),
            TransportMode::LongHaul
        );
        assert!("radio".parse::<TransportMode>().is_err());
    }

    #[test]
    fn relay_channels_are_bounds_checked() {
        let relay = RelayConfig {
            ip: "192.168.0.40".into(),
            username: "u".into(),
            password: "p".into(),
            lan_channel: 1,
            long_haul_channel: 5,
        };
        assert!(relay.validate().is_err());
        assert_eq!(relay.channel_for(TransportMode::Lan), 1);
    }

    #[test]
    fn non_positive_timesteps_are_rejected() {
        let mut instrument = FdsnInstrumentConfig {
            ip: "192.168.0.60".into(),
            network: "AV".into(),
            station: "STA2".into(),
            location: String::new(),
            channels: vec!["HHZ".into()],
            soh_channels: vec![],
            timestep_minutes: 10,
        };
        assert!(instrument.validate().is_ok());

        for bad in [0, -10] {
            instrument.timestep_minutes = bad;
            assert!(
                matches!(instrument.validate(), Err(TelemetryError::Config(_))),
                "timestep {bad} should be rejected"
            );
        }
    }

    #[test]
    fn missing_long_haul_settings_are_config_errors() {
        let telemetry = TelemetryConfig {
            mode: TransportMode::LongHaul,
            transceiver_ip: "192.168.0.30".into(),
            target_ip: "203.0.113.5".into(),
            target_port: None,
            token: None,
            lan_user: None,
        };
        assert!(matches!(
            telemetry.target_port(),
            Err(TelemetryError::Config(_))
        ));
        assert!(matches!(telemetry.token(), Err(TelemetryError::Config(_))));
    }
}
