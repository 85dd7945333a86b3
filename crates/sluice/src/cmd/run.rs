//! Run command - load a config and drive the stream until interrupted

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use sluice_config::EngineConfig;
use sluice_manager::{Environment, Resources};
use sluice_stream::Stream;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sluice.toml")]
    pub config: PathBuf,

    /// File of KEY=VALUE pairs loaded into the environment before the
    /// config is interpolated
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Grace period for draining in-flight work on shutdown
    #[arg(long, default_value = "20s", value_parser = humantime::parse_duration)]
    pub shutdown_timeout: Duration,
}

pub fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(20)
}

pub async fn run(args: RunArgs) -> Result<()> {
    if let Some(env_file) = &args.env_file {
        load_env_file(env_file)
            .with_context(|| format!("failed to load env file {}", env_file.display()))?;
    }

    let config = EngineConfig::from_path(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;

    let mut env = Environment::new();
    sluice_components::register_all(&mut env);
    let env = Arc::new(env);

    let resources =
        Resources::build(Arc::clone(&env), &config.resources).context("failed to build resources")?;

    let stream = Stream::new(&config, &env, &resources).context("failed to build stream")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, stopping stream");
            stream.stop_within(args.shutdown_timeout).await?;
        }
        _ = stream.wait() => {
            tracing::info!("stream finished");
        }
    }

    resources.close_all().await;
    Ok(())
}

/// Load KEY=VALUE lines into the process environment. Blank lines and
/// `#` comments are skipped.
fn load_env_file(path: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("malformed env line: {line}");
        };
        std::env::set_var(key.trim(), value.trim());
    }
    Ok(())
}
