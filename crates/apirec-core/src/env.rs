//! Environment variable handling.

use std::env;
use std::path::Path;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a u16 (e.g., for ports).
pub fn get_u16(name: &str) -> Option<u16> {
    get_var(name).and_then(|v| v.parse().ok())
}

/// Load environment variables from a .env file in the working directory.
///
/// Variables that are already set are left untouched. A missing file is not
/// an error.
pub fn load_dotenv() -> Result<(), dotenvy::Error> {
    load_dotenv_from(Path::new(".env"))
}

/// Load environment variables from `path`, keeping variables already set.
pub fn load_dotenv_from(path: &Path) -> Result<(), dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Common environment variable names.
pub mod vars {
    /// API key for the Zhipu embedding and chat APIs.
    pub const ZHIPUAI_API_KEY: &str = "ZHIPUAI_API_KEY";

    /// API key for the Pinecone vector index.
    pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";

    /// apirec home directory override.
    pub const APIREC_HOME: &str = "APIREC_HOME";

    /// apirec config file override.
    pub const APIREC_CONFIG: &str = "APIREC_CONFIG";

    /// apirec log filter.
    pub const APIREC_LOG: &str = "APIREC_LOG";

    /// Gateway port override.
    pub const APIREC_PORT: &str = "APIREC_PORT";
}
