//! apirec command-line interface.

pub mod bootstrap;
pub mod commands;
pub mod logging;
pub mod render;
pub mod repl;

use clap::{Parser, Subcommand};

/// apirec - semantic API recommendations with explanations
#[derive(Parser)]
#[command(name = "apirec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "APIREC_CONFIG", global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Embed a catalog and write it to the index
    Ingest(commands::ingest::IngestArgs),

    /// Ask for recommendations
    Ask(commands::ask::AskArgs),

    /// Start the HTTP gateway
    Serve(commands::serve::ServeArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Run diagnostics
    Doctor(commands::doctor::DoctorArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let explicit = cli.config.as_deref();

    match cli.command {
        Commands::Config(args) => commands::config::run(args, explicit).await,
        Commands::Doctor(args) => commands::doctor::run(args, explicit).await,
        Commands::Version => {
            println!("apirec {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Ingest(args) => {
            let config = bootstrap::load_config(explicit)?;
            commands::ingest::run(args, &config).await
        }
        Commands::Ask(args) => {
            let config = bootstrap::load_config(explicit)?;
            commands::ask::run(args, &config).await
        }
        Commands::Serve(args) => {
            let config = bootstrap::load_config(explicit)?;
            commands::serve::run(args, &config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_version() {
        let cli = Cli::try_parse_from(["apirec", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from([
            "apirec",
            "ingest",
            "apis.jsonl",
            "--reset",
            "--batch-size",
            "20",
            "--delay-ms",
            "0",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.catalog, std::path::PathBuf::from("apis.jsonl"));
                assert!(args.reset);
                assert_eq!(args.batch_size, Some(20));
                assert_eq!(args.delay_ms, Some(0));
                assert_eq!(args.concurrency, None);
            }
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["apirec", "ask", "天气查询", "-k", "3"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.query.as_deref(), Some("天气查询"));
                assert_eq!(args.top_k, Some(3));
            }
            _ => panic!("Expected Ask command"),
        }

        let cli = Cli::try_parse_from(["apirec", "ask"]).unwrap();
        assert!(matches!(cli.command, Commands::Ask(ref args) if args.query.is_none()));
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["apirec", "-v", "serve", "--port", "8080", "--bind", "lan"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.bind.as_deref(), Some("lan"));
                assert!(!args.no_cors);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_parse_config_get() {
        let cli = Cli::try_parse_from(["apirec", "config", "get", "gateway.port"]).unwrap();
        match cli.command {
            Commands::Config(args) => match args.command {
                commands::config::ConfigCommand::Get { key } => assert_eq!(key, "gateway.port"),
                _ => panic!("Expected Config Get command"),
            },
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(Cli::try_parse_from(["apirec", "gateway"]).is_err());
    }
}
