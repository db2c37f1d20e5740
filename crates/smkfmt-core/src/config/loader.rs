//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::formatter_config::FormatterConfiguration;
use crate::{Result, SmkfmtError};

/// Config file names in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &["smkfmt.toml", ".smkfmt.toml", "pyproject.toml"];

/// `pyproject.toml` with an optional `[tool.smkfmt]` table
#[derive(Debug, Default, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTools>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProjectTools {
    smkfmt: Option<FormatterConfiguration>,
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// In each directory `smkfmt.toml` wins over `.smkfmt.toml`, which wins
    /// over a `pyproject.toml` holding a `[tool.smkfmt]` table.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| SmkfmtError::config_error(format!("Invalid path: {e}")))?;
        if current.is_file()
            && let Some(parent) = current.parent()
        {
            current = parent.to_path_buf();
        }

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if !config_path.is_file() {
                    continue;
                }
                if *filename == "pyproject.toml" && Self::read_pyproject(&config_path)?.is_none() {
                    continue;
                }
                tracing::debug!("Found config: {}", config_path.display());
                return Ok(Some(config_path));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<FormatterConfiguration> {
        let config = if path.file_name().is_some_and(|name| name == "pyproject.toml") {
            Self::read_pyproject(path)?.unwrap_or_default()
        } else {
            let content = Self::read(path)?;
            toml::from_str(&content).map_err(|e| {
                SmkfmtError::config_error(format!(
                    "Failed to load config from '{}': {}",
                    path.display(),
                    e
                ))
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from path or auto-discover
    ///
    /// Without an explicit path and without a discoverable file the default
    /// configuration is returned.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<FormatterConfiguration> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(SmkfmtError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(FormatterConfiguration::default())
            }
        }
    }

    fn read(path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| {
            SmkfmtError::config_error(format!("Failed to read '{}': {}", path.display(), e))
        })
    }

    fn read_pyproject(path: &Path) -> Result<Option<FormatterConfiguration>> {
        let content = Self::read(path)?;
        let project: PyProject = toml::from_str(&content).map_err(|e| {
            SmkfmtError::config_error(format!("Invalid '{}': {}", path.display(), e))
        })?;
        Ok(project.tool.and_then(|tool| tool.smkfmt))
    }
}
