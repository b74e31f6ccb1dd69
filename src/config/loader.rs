use std::path::{Path, PathBuf};

use crate::args::DEFAULT_CONFIG_FILES;
use crate::error::ConfigError;

use super::types::{ConfigFile, LoadedConfig};

/// Loads a configuration file from the provided path, or from the first
/// default file present in the working directory.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Option<LoadedConfig>, ConfigError> {
    let Some(path) = path.map(PathBuf::from).or_else(default_config_path) else {
        return Ok(None);
    };
    let file = load_config_file(&path)?;
    Ok(Some(LoadedConfig { path, file }))
}

fn default_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

pub(crate) fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source: err,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: err,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source: err,
        }),
        Some(ext) => Err(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        }),
        None => Err(ConfigError::MissingExtension),
    }
}
