//! Diagnostic commands.

use crate::bootstrap;
use apirec_core::config::{Config, IndexBackend};
use apirec_core::env::{self, vars};
use apirec_core::paths;
use apirec_memory::VectorIndex;
use clap::Args;
use console::{style, Emoji};
use std::path::Path;

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {
    /// Also contact the index
    #[arg(long)]
    pub full: bool,
}

/// Run the doctor command.
pub async fn run(args: DoctorArgs, explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("apirec Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    println!("Checking directories...");
    match paths::base_dir() {
        Ok(dir) if dir.exists() => {
            println!("  {} Base directory exists: {}", style(CHECK).green(), dir.display());
        }
        Ok(dir) => {
            println!("  {} Base directory missing: {}", style(WARN).yellow(), dir.display());
            warnings += 1;
        }
        Err(e) => {
            println!("  {} Failed to determine base directory: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    println!("\nChecking configuration...");
    let config = match bootstrap::load_config(explicit) {
        Ok(config) => {
            println!("  {} Configuration valid", style(CHECK).green());
            Some(config)
        }
        Err(e) => {
            println!("  {} {:#}", style(CROSS).red(), e);
            errors += 1;
            None
        }
    };

    println!("\nChecking credentials...");
    if let Some(config) = &config {
        match config.embedding_api_key() {
            Ok(_) => println!("  {} Embedding API key available", style(CHECK).green()),
            Err(_) => {
                println!("  {} {} not set", style(CROSS).red(), vars::ZHIPUAI_API_KEY);
                errors += 1;
            }
        }
        match config.index.backend {
            IndexBackend::Pinecone => match config.index_api_key() {
                Ok(_) => println!("  {} Pinecone API key available", style(CHECK).green()),
                Err(_) => {
                    println!("  {} {} not set", style(CROSS).red(), vars::PINECONE_API_KEY);
                    errors += 1;
                }
            },
            IndexBackend::Local => {
                println!("  {} Using the local index backend", style(CHECK).green());
            }
        }
    } else if env::get_var(vars::ZHIPUAI_API_KEY).is_none() {
        println!("  {} {} not set", style(WARN).yellow(), vars::ZHIPUAI_API_KEY);
        warnings += 1;
    }

    if args.full {
        if let Some(config) = &config {
            println!("\nChecking index...");
            match check_index(config).await {
                Ok(count) => println!(
                    "  {} Index '{}' reachable with {} vectors",
                    style(CHECK).green(),
                    config.index.name,
                    count
                ),
                Err(e) => {
                    println!("  {} {:#}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
        }
    }

    println!();
    if errors > 0 {
        println!(
            "{} {} error(s), {} warning(s)",
            style("Doctor found problems:").red().bold(),
            errors,
            warnings
        );
        anyhow::bail!("{} check(s) failed", errors);
    }
    println!(
        "{} {} warning(s)",
        style("All checks passed.").green().bold(),
        warnings
    );
    Ok(())
}

async fn check_index(config: &Config) -> anyhow::Result<usize> {
    let index = bootstrap::vector_index(config)?;
    Ok(index.count().await?)
}
