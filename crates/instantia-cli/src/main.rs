//! Instantia command-line harness
//!
//! Builds the same single-field value type through every construction
//! strategy, either printing one line per path (`demo`) or timing each
//! path against plain construction (`compare`).

mod commands;
mod holder;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::{resolve_color_choice, StyledOutput};

/// Environment variable holding the default log filter
const LOG_ENV: &str = "INSTANTIA_LOG";

#[derive(Parser)]
#[command(name = "instantia")]
#[command(about = "Contrast runtime object construction strategies", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "debug" or "instantia_engine=trace" (overrides INSTANTIA_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Construct a value holder through each strategy and print its value
    Demo {
        /// Wait for a key press before exiting
        #[arg(long)]
        wait: bool,
        /// Factory configuration file (defaults to ./instantia.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Measure build time and steady-state per-call time of each strategy
    Compare {
        /// Calls timed per strategy
        #[arg(short = 'n', long, default_value_t = 100_000)]
        iterations: usize,
        /// Factory configuration file (defaults to ./instantia.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {}", e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;
    let mut out = StyledOutput::new(resolve_color_choice(cli.color.as_deref()));

    match cli.command {
        Commands::Demo { wait, config } => {
            let config = commands::load_config(config.as_deref())?;
            commands::demo::execute(config, wait, &mut out)
        }
        Commands::Compare { iterations, config } => {
            let config = commands::load_config(config.as_deref())?;
            commands::compare::execute(config, iterations, &mut out)
        }
    }
}
