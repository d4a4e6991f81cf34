//! apirec CLI entry point.

use apirec_cli::{bootstrap, logging, run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = apirec_core::env::load_dotenv() {
        eprintln!("Ignoring unreadable .env file: {}", e);
    }

    // Logging settings come from the config file when it parses
    let settings = bootstrap::load_config(cli.config.as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init(cli.verbose, &settings);

    run(cli).await
}
