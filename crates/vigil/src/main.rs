//! Vigil launcher.
//!
//! One binary carries the node-side monitor daemon, the hub-side migration
//! daemon, and the operator utilities (telemeter, data-query, toggle-relay,
//! configure). Configuration comes from an explicit `--config` path or the
//! `VIGIL_CONFIG` environment variable; there is no home-relative fallback.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use vigil::config::Config;
use vigil_telemetry::{SwitchState, TransportMode};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Data custody for unattended field monitoring nodes")]
struct Cli {
    /// Path to the node configuration file
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging (info/debug to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for daily-rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch receive/transmit directories and drive the pipeline
    Monitor,

    /// Transmit staged files: one file, one stream, or the whole backlog
    Telemeter {
        /// Deliver a single staged file instead of the backlog
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Restrict the pass to one stream directory
        #[arg(short, long)]
        stream: Option<String>,

        /// Override the configured transport mode (lan | long-haul)
        #[arg(short, long)]
        mode: Option<TransportMode>,

        /// Cap on files attempted in one pass
        #[arg(long, default_value_t = vigil_telemetry::batch::DEFAULT_FILE_LIMIT)]
        file_limit: usize,
    },

    /// Hub-side daemon: watch upload directories, re-file into the archive
    Migrate {
        /// Archive root to migrate into
        #[arg(short, long)]
        archive: PathBuf,

        /// Upload directory to watch (repeatable)
        #[arg(short = 'm', long = "monitor", required = true)]
        watch: Vec<PathBuf>,
    },

    /// Fetch the latest data window from an instrument
    DataQuery {
        /// Instrument family to query (gnss | seismic | magnetic)
        instrument: String,
    },

    /// Drive one switch on the power relay
    ToggleRelay {
        /// Relay switch number (1-4)
        #[arg(short, long)]
        relay: u8,

        /// Switch position (open | close)
        #[arg(short, long)]
        state: SwitchState,
    },

    /// Manage the installed configuration file
    Configure {
        #[command(subcommand)]
        action: cli::configure::ConfigureAction,
    },
}

fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    let path =
        config_path.context("no configuration file given (use --config or VIGIL_CONFIG)")?;
    Config::load(path)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.clone();
    let config_path = config_path.as_deref();

    match cli.command {
        Commands::Monitor => cli::monitor::run(load_config(config_path)?),
        Commands::Telemeter {
            file,
            stream,
            mode,
            file_limit,
        } => cli::telemeter::run(
            load_config(config_path)?,
            cli::telemeter::TelemeterArgs {
                file,
                stream,
                mode,
                file_limit,
            },
        ),
        Commands::Migrate { archive, watch } => cli::migrate::run(
            load_config(config_path)?,
            cli::migrate::MigrateArgs { archive, watch },
        ),
        Commands::DataQuery { instrument } => {
            cli::query::run(load_config(config_path)?, &instrument)
        }
        Commands::ToggleRelay { relay, state } => {
            cli::relay::run(load_config(config_path)?, relay, state)
        }
        Commands::Configure { action } => cli::configure::run(action, config_path),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match vigil_logging::init_logging(vigil_logging::LogConfig {
        log_dir: cli.log_dir.as_deref(),
        verbose: cli.verbose,
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
