//! Query command.

use crate::bootstrap;
use crate::repl::{self, Repl};
use apirec_core::Config;
use clap::Args;
use std::sync::Arc;

/// Ask command arguments.
#[derive(Args)]
pub struct AskArgs {
    /// Query to answer once; starts an interactive loop when omitted
    pub query: Option<String>,

    /// Number of recommendations
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

/// Run the ask command.
pub async fn run(args: AskArgs, config: &Config) -> anyhow::Result<()> {
    if args.top_k == Some(0) {
        anyhow::bail!("--top-k must be greater than 0");
    }

    let engine = Arc::new(bootstrap::engine(config)?);

    match args.query {
        Some(query) if !query.trim().is_empty() => {
            repl::answer(&engine, query.trim(), args.top_k).await
        }
        Some(_) => anyhow::bail!("Query is empty"),
        None => Repl::new(engine, args.top_k).run().await,
    }
}
