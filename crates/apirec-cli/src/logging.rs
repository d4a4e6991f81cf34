//! tracing-subscriber setup.

use apirec_core::config::{LogFormat, LogLevel, LoggingConfig};
use apirec_core::env::{self, vars};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a verbosity count and configured level.
///
/// Each `-v` raises the level one step above the configured one.
pub fn default_directive(verbose: u8, level: LogLevel) -> String {
    const LEVELS: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];
    let base = LEVELS.iter().position(|l| *l == level).unwrap_or(2);
    let level = LEVELS[(base + verbose as usize).min(LEVELS.len() - 1)];
    format!("apirec={level},tower_http={level}", level = level.as_str())
}

/// Install the global subscriber.
///
/// `APIREC_LOG`, then `RUST_LOG`, override the computed default.
pub fn init(verbose: u8, config: &LoggingConfig) {
    let filter = env::get_var(vars::APIREC_LOG)
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose, config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
