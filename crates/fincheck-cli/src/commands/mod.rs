//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use fincheck_core::FincheckConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fincheck")
        .join("config.json")
}

/// Config file selected by `--config`, else the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicitly given path must exist.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FincheckConfig> {
    if let Some(path) = config_path {
        return Ok(FincheckConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        Ok(FincheckConfig::from_file(&path)?)
    } else {
        Ok(FincheckConfig::default())
    }
}
