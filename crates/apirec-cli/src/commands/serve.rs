//! Serve command.

use crate::bootstrap;
use apirec_core::config::BindMode;
use apirec_core::Config;
use apirec_gateway::{AppState, Gateway};
use clap::Args;

/// Serve command arguments.
#[derive(Args)]
pub struct ServeArgs {
    /// Port number (overrides the config file)
    #[arg(short, long, env = "APIREC_PORT")]
    pub port: Option<u16>,

    /// Bind mode (loopback, lan)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

/// Parse a bind mode name.
pub fn parse_bind(bind: &str) -> anyhow::Result<BindMode> {
    match bind {
        "loopback" => Ok(BindMode::Loopback),
        "lan" => Ok(BindMode::Lan),
        _ => anyhow::bail!("Invalid bind mode: {}", bind),
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let mut gateway_config = config.gateway.clone();
    if let Some(port) = args.port {
        gateway_config.port = port;
    }
    if let Some(bind) = &args.bind {
        gateway_config.bind = parse_bind(bind)?;
    }
    if args.no_cors {
        gateway_config.cors = false;
    }

    let engine = bootstrap::engine(config)?;
    Gateway::new(gateway_config, AppState::new(engine)).run().await?;
    Ok(())
}
