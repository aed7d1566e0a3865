//! # Settings Module
//!
//! ## Purpose
//! Persistent user settings for the formula tools: which periodic table to parse
//! against and how verbose logging should be.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "periodic_table": "my_isotopes.json",
//!   "log_level": "warn"
//! }
//! ```
//! A missing `periodic_table` means the table bundled with the crate.
//!
//! ## Usage Pattern
//! ```rust,no_run
//! use ChemFormula::settings::ChemistrySettings;
//! use ChemFormula::Chemistry::formula_parser::ChemicalFormulaParser;
//!
//! let settings = ChemistrySettings::new();
//! let table = settings.periodic_table().unwrap();
//! let parser = ChemicalFormulaParser::new(&table);
//! ```

use crate::Chemistry::periodic_table::{PeriodicTable, PeriodicTableError};
use crate::logging::parse_level;
use log::{LevelFilter, debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chemistry_config.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("File does not exist: {0}")]
    MissingFile(String),
    #[error(transparent)]
    PeriodicTable(#[from] PeriodicTableError),
}

/// Serializable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemistryConfig {
    /// JSON periodic table to use instead of the bundled one
    #[serde(default)]
    pub periodic_table: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ChemistryConfig {
    fn default() -> Self {
        Self {
            periodic_table: None,
            log_level: default_log_level(),
        }
    }
}

/// Settings bound to the file they are persisted in.
///
/// Every successful change is written back immediately.
#[derive(Debug, Clone)]
pub struct ChemistrySettings {
    config: ChemistryConfig,
    config_file: String,
}

impl Default for ChemistrySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl ChemistrySettings {
    /// Loads `chemistry_config.json` from the working directory.
    ///
    /// A missing or unreadable file yields the default settings.
    pub fn new() -> Self {
        Self::with_config_file(DEFAULT_CONFIG_FILE)
    }

    /// Loads settings from a custom configuration file path
    ///
    /// # Arguments
    /// * `config_file` - Path to the configuration file
    ///
    /// # Returns
    /// Settings with the loaded configuration, or the defaults when the file
    /// does not exist or cannot be parsed
    pub fn with_config_file(config_file: &str) -> Self {
        let config = Self::load_config(config_file).unwrap_or_default();
        Self {
            config,
            config_file: config_file.to_string(),
        }
    }

    /// Reads a configuration file. A file that does not exist is not an error.
    pub fn load_config(config_file: &str) -> Result<ChemistryConfig, SettingsError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            let config: ChemistryConfig = serde_json::from_str(&content)?;
            debug!("loaded settings from '{}'", config_file);
            Ok(config)
        } else {
            Ok(ChemistryConfig::default())
        }
    }

    /// Writes the current configuration to the config file as pretty JSON
    pub fn save_config(&self) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_file, content)?;
        debug!("saved settings to '{}'", self.config_file);
        Ok(())
    }

    pub fn get_config(&self) -> &ChemistryConfig {
        &self.config
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Switches to another periodic table file.
    ///
    /// # Arguments
    /// * `path` - JSON periodic table; must exist
    ///
    /// # Returns
    /// * `Ok(())` - If the file exists and the settings were saved
    /// * `Err(SettingsError::MissingFile)` - If it does not; the settings are unchanged
    pub fn set_periodic_table(&mut self, path: &str) -> Result<(), SettingsError> {
        if !Path::new(path).exists() {
            return Err(SettingsError::MissingFile(path.to_string()));
        }
        self.config.periodic_table = Some(path.to_string());
        self.save_config()?;
        info!("periodic table set to '{}'", path);
        Ok(())
    }

    /// Goes back to the bundled periodic table
    pub fn use_bundled_periodic_table(&mut self) -> Result<(), SettingsError> {
        self.config.periodic_table = None;
        self.save_config()
    }

    pub fn set_log_level(&mut self, level: &str) -> Result<(), SettingsError> {
        self.config.log_level = level.trim().to_lowercase();
        self.save_config()
    }

    pub fn log_level(&self) -> LevelFilter {
        parse_level(&self.config.log_level)
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), SettingsError> {
        self.config = ChemistryConfig::default();
        self.save_config()
    }

    /// The configured periodic table, or the bundled one when none is configured
    pub fn periodic_table(&self) -> Result<PeriodicTable, SettingsError> {
        let table = match &self.config.periodic_table {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(SettingsError::MissingFile(path.clone()));
                }
                PeriodicTable::from_file(path)?
            }
            None => PeriodicTable::bundled()?,
        };
        Ok(table)
    }
}
