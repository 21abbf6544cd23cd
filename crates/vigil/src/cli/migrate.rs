//! `vigil migrate`: the hub-side migration daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use vigil::config::Config;
use vigil::monitor;

#[derive(Debug)]
pub struct MigrateArgs {
    pub archive: PathBuf,
    pub watch: Vec<PathBuf>,
}

pub fn run(config: Config, args: MigrateArgs) -> Result<ExitCode> {
    let shutdown = super::shutdown_flag()?;
    // Hub archives nest each family under its own prefix.
    let ctx = config.migrate_context(true);
    monitor::run_migrate(&args.archive, &args.watch, &ctx, shutdown)?;
    Ok(ExitCode::SUCCESS)
}
