//! TOML configuration for the dashboard: workbook location, sheet selection,
//! and export directory. CLI flags override everything here.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::DATA_FILE;

pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# pgtadash configuration
# CLI flags override values set here.

[data]
# Workbook read at startup (first worksheet unless `sheet` is set).
path = "pre_analysis_last.xlsx"
# Worksheet name or 0-based index, e.g. "Sheet1" or "0".
# sheet = "0"

[export]
# Directory the CSV downloads and chart PNGs are written to.
directory = "."
"#;

/// Manages the config directory and config file operations.
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing).
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name.
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write the default configuration template. Refuses to overwrite an
    /// existing file unless `force` is set.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path();
        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }
        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(config_path)
    }
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DATA_FILE),
            sheet: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    /// Load the config file, falling back to defaults when it does not exist.
    /// A file that exists but fails to parse is an error, not a silent default.
    pub fn load(manager: &ConfigManager) -> Result<Self> {
        let path = manager.config_path();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| eyre!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }
}
