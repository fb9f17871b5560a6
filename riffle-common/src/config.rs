//! Configuration loading and library root resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Settings readable from the optional TOML config file
///
/// All fields are optional; anything absent falls through to the next
/// resolution tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Directory holding the sample library
    pub library_root: Option<PathBuf>,
    /// Destination folder name in cloud storage
    pub archive_folder: Option<String>,
}

impl TomlConfig {
    /// Load the config file from the platform config directory, if present.
    ///
    /// A missing file is not an error (empty config); a malformed file is.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Resolve the library root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Compiled default (fallback)
pub fn resolve_library_root(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = TomlConfig::load()?.library_root {
        return Ok(path);
    }

    // Priority 4: Compiled default
    Ok(default_library_root())
}

/// Platform config file location (`<config dir>/riffle/config.toml`)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("riffle").join("config.toml"))
}

/// Default sample library location: `<audio dir>/riffle`, falling back to
/// `./samples` on platforms without a standard audio directory.
pub fn default_library_root() -> PathBuf {
    dirs::audio_dir()
        .map(|d| d.join("riffle"))
        .unwrap_or_else(|| PathBuf::from("samples"))
}
