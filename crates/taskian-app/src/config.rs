use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use taskian_core::DEFAULT_UNDO_DEPTH;

const CONFIG_DIR: &str = "taskian";
const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "data.json";

/// Top-level configuration loaded from `<config dir>/taskian/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where session data lives. Defaults to `<data dir>/taskian/data.json`.
    pub data_file: Option<PathBuf>,
    /// Snapshots kept per undo buffer.
    pub undo_depth: usize,
    /// Terminal output options.
    pub display: DisplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            undo_depth: DEFAULT_UNDO_DEPTH,
            display: DisplayConfig::default(),
        }
    }
}

/// Terminal output options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Emit ANSI colors for headers and progress bars.
    pub color: bool,
    /// Render done subtasks with a combining strike-through instead of a
    /// `[Done]` suffix.
    pub strike_through: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            strike_through: true,
        }
    }
}

impl AppConfig {
    /// Default configuration path under the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from `explicit`, or from the default path.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::from_path(path);
        }
        match Self::default_path() {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a file, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the data file, applying the platform default when unset.
    ///
    /// # Errors
    /// Returns an error when no data directory can be determined.
    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_file {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(DATA_FILE))
            .ok_or_else(|| anyhow!("failed to determine a data directory; set data_file in the config"))
    }

    fn validate(&self) -> Result<()> {
        if self.undo_depth == 0 {
            bail!("undo_depth must be at least 1");
        }
        if self
            .data_file
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            bail!("data_file must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = AppConfig::from_path(dir.path().join(CONFIG_FILE))?;
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.undo_depth, DEFAULT_UNDO_DEPTH);
        assert!(cfg.display.color);
        Ok(())
    }

    #[test]
    fn load_partial_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "data_file = \"/tmp/tasks.json\"\n\n[display]\ncolor = false\n",
        )?;

        let cfg = AppConfig::from_path(&path)?;
        assert_eq!(cfg.data_path()?, PathBuf::from("/tmp/tasks.json"));
        assert!(!cfg.display.color);
        assert!(cfg.display.strike_through);
        assert_eq!(cfg.undo_depth, DEFAULT_UNDO_DEPTH);
        Ok(())
    }

    #[test]
    fn zero_undo_depth_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "undo_depth = 0\n")?;

        let Err(err) = AppConfig::from_path(&path) else {
            panic!("undo_depth = 0 should error");
        };
        assert!(format!("{err:#}").contains("undo_depth must be at least 1"));
        Ok(())
    }

    #[test]
    fn malformed_toml_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "undo_depth = \"many\"\n")?;

        let Err(err) = AppConfig::from_path(&path) else {
            panic!("string undo_depth should error");
        };
        assert!(err.to_string().contains("failed to parse"));
        Ok(())
    }

    #[test]
    fn explicit_path_must_exist() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope.toml");
        let Err(err) = AppConfig::load(Some(&missing)) else {
            panic!("missing explicit config should error");
        };
        assert!(err.to_string().contains("does not exist"));
        Ok(())
    }
}
