//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the apirec base directory (`$APIREC_HOME` or `~/.apirec`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(env::vars::APIREC_HOME) {
        return Ok(expand_tilde(&home));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".apirec"))
}

/// Get the main config file path (`~/.apirec/apirec.json5`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("apirec.json5"))
}

/// Get the REPL history file path (`~/.apirec/history`).
pub fn history_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("history"))
}

/// Get the directory holding local index files (`~/.apirec/indexes`).
pub fn indexes_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("indexes"))
}

/// Get the file backing a named local index.
pub fn local_index_file(name: &str) -> Result<PathBuf, ConfigError> {
    Ok(indexes_dir()?.join(format!("{}.json", name)))
}

/// Ensure all required directories exist.
pub fn ensure_dirs() -> Result<(), ConfigError> {
    for dir in [base_dir()?, indexes_dir()?] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
