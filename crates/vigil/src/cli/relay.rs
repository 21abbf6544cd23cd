//! `vigil toggle-relay`: drive one switch on the power relay.

use std::process::ExitCode;

use anyhow::{ensure, Result};

use vigil::config::Config;
use vigil_telemetry::relay::set_state;
use vigil_telemetry::SwitchState;

pub fn run(config: Config, channel: u8, state: SwitchState) -> Result<ExitCode> {
    ensure!(
        (1..=4).contains(&channel),
        "relay switch {channel} out of range (1-4)"
    );
    let relay = config.relay()?;

    let code = set_state(relay, channel, state);
    if code == 0 {
        let word = match state {
            SwitchState::Open => "open",
            SwitchState::Closed => "closed",
        };
        println!("relay switch {channel} is now {word}");
    } else {
        eprintln!("relay command failed with status {code}");
    }
    Ok(super::exit_from_status(code))
}
