//! `vigil monitor`: the node-side pipeline daemon.

use std::process::ExitCode;

use anyhow::Result;

use vigil::config::Config;
use vigil::monitor::Monitor;

pub fn run(config: Config) -> Result<ExitCode> {
    let shutdown = super::shutdown_flag()?;
    let monitor = Monitor::new(config)?;
    monitor.run(shutdown)?;
    Ok(ExitCode::SUCCESS)
}
