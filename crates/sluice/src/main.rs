//! Sluice - configurable data streaming engine
//!
//! # Usage
//!
//! ```bash
//! # Run a stream from a config file (default command)
//! sluice
//! sluice --config sluice.toml
//!
//! # Print a starter config document
//! sluice create
//! sluice create stdin/mapping,compress/stdout
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sluice - configurable data streaming engine
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Args that apply to run when no subcommand is given
    /// Path to the configuration file
    #[arg(short, long, default_value = "sluice.toml")]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a stream from a config file
    Run(cmd::run::RunArgs),

    /// Print a starter config document
    Create(cmd::create::CreateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Run(args)) => {
            init_logging(&cli.log_level)?;
            cmd::run::run(args).await
        }
        Some(Command::Create(args)) => cmd::create::run(args),
        // No subcommand = run the stream (default behavior)
        None => {
            init_logging(&cli.log_level)?;
            let args = cmd::run::RunArgs {
                config: cli.config,
                env_file: None,
                shutdown_timeout: cmd::run::default_shutdown_timeout(),
            };
            cmd::run::run(args).await
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
