use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sentinel_api::{shutdown_signal, SentinelConfig, SentinelServer};

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "AI-assisted security camera monitoring dashboard",
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the HTTP bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            SentinelConfig::from_file(path)
                .with_context(|| format!("failed to load config from {path}"))?
        }
        None => SentinelConfig::from_env().context("failed to load config from environment")?,
    };
    if let Some(bind) = cli.bind {
        config.http.bind_addr = bind;
    }

    let server = SentinelServer::new(config).context("failed to build server")?;
    server.run(shutdown_signal()).await?;
    Ok(())
}
