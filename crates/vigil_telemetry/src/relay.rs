//! Control of the network-attached power relay.
//!
//! The relay is an HTTP device: setting `relay{N}State=1` in its `state.xml`
//! closes switch N and powers the attached equipment; `0` opens it. The
//! device is on the node's wired LAN, so a failed ping means it is absent
//! or dead, not that the backhaul is down.

use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::config::RelayConfig;

/// Position of one relay switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    /// Circuit broken, equipment unpowered.
    Open,
    /// Circuit closed, equipment powered.
    Closed,
}

impl SwitchState {
    /// Value the relay's `state.xml` endpoint expects.
    pub fn as_value(&self) -> u8 {
        match self {
            SwitchState::Open => 0,
            SwitchState::Closed => 1,
        }
    }
}

impl std::str::FromStr for SwitchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SwitchState::Open),
            "close" | "closed" => Ok(SwitchState::Closed),
            other => Err(format!("unknown switch state '{other}' (expected open or close)")),
        }
    }
}

/// Drive one switch on the relay to `state`.
///
/// Returns the exit status of the underlying command: nonzero if the relay
/// did not answer pings or the HTTP request failed.
pub fn set_state(relay: &RelayConfig, channel: u8, state: SwitchState) -> i32 {
    let code = vigil_exec::ping(&relay.ip, 3);
    if code != 0 {
        warn!(ip = %relay.ip, "power relay did not answer pings");
        return code;
    }

    let url = format!(
        "http://{}/state.xml?relay{}State={}",
        relay.ip,
        channel,
        state.as_value()
    );
    info!(channel, state = state.as_value(), "setting relay switch");

    let mut command = Command::new("curl");
    command
        .args(["-s", "-S", "-u"])
        .arg(format!("{}:{}", relay.username, relay.password))
        .arg(&url)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    vigil_exec::run_with_retry(&mut command, 1)
}
