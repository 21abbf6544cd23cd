//! CLI command implementations.
//!
//! Each module owns one subcommand: an args struct filled in by `main.rs`
//! and a `run` function returning the process exit code. Human-readable
//! progress goes to stdout; diagnostics go through `tracing`.

pub mod configure;
pub mod migrate;
pub mod monitor;
pub mod query;
pub mod relay;
pub mod telemeter;

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;

/// Map a command's exit status onto the process exit code, clamped to the
/// nonzero u8 range.
pub fn exit_from_status(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(code.clamp(1, 255) as u8)
    }
}

/// A flag flipped by SIGINT/SIGTERM, polled by the long-running loops.
#[cfg(unix)]
pub fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&flag))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&flag))?;
    Ok(flag)
}

#[cfg(not(unix))]
pub fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    Ok(Arc::new(AtomicBool::new(false)))
}
