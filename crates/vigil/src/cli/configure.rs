//! `vigil configure`: manage the installed configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;

use vigil::config::Config;

pub const DEFAULT_INSTALL_PATH: &str = "/etc/vigil/config.toml";

#[derive(Subcommand, Debug)]
pub enum ConfigureAction {
    /// Validate the file given with --config and copy it into place
    Install {
        /// Installed location
        #[arg(long, default_value = DEFAULT_INSTALL_PATH)]
        dest: PathBuf,
    },
    /// Remove the installed configuration file
    Uninstall {
        /// Installed location
        #[arg(long, default_value = DEFAULT_INSTALL_PATH)]
        dest: PathBuf,
    },
    /// Validate and pretty-print the configuration
    Report,
}

pub fn run(action: ConfigureAction, config_path: Option<&Path>) -> Result<ExitCode> {
    match action {
        ConfigureAction::Install { dest } => {
            let source =
                config_path.context("install needs --config pointing at the file to install")?;
            // Parse before copying so a broken file never lands installed.
            let config = Config::load(source)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&dest, toml::to_string_pretty(&config)?)
                .with_context(|| format!("failed to write {}", dest.display()))?;
            println!("installed {} -> {}", source.display(), dest.display());
        }
        ConfigureAction::Uninstall { dest } => {
            if dest.is_file() {
                fs::remove_file(&dest)
                    .with_context(|| format!("failed to remove {}", dest.display()))?;
                println!("removed {}", dest.display());
            } else {
                println!("nothing installed at {}", dest.display());
            }
        }
        ConfigureAction::Report => {
            let source = config_path.context("report needs --config")?;
            let config = Config::load(source)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
