//! Repository configuration stored in `dbg.toml`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::errors::CliError;

pub const CONFIG_FILE_NAME: &str = "dbg.toml";

/// Defaults for a repository, overridden by flags and environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RepoConfig {
    pub driver_name: Option<String>,
    pub architecture: Option<String>,
    pub driver_versions: Vec<String>,
    /// Directory used as object store by the `drivers` commands.
    pub bucket: Option<String>,
}

/// Returns the config file path inside `repo_root`.
pub fn config_path(repo_root: &Utf8Path) -> Utf8PathBuf {
    repo_root.join(CONFIG_FILE_NAME)
}

/// Loads `dbg.toml` from the repository root.
/// A missing file yields the default configuration; a broken one is an error.
pub fn load_config(repo_root: &Utf8Path) -> Result<RepoConfig, CliError> {
    let path = config_path(repo_root);
    if !path.exists() {
        return Ok(RepoConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|source| CliError::ConfigParseError { path, source })
}
