//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::EngineConfig;

/// The configuration file looked up inside a configuration directory.
pub const ENGINE_CONFIG_FILE: &str = "engine.yaml";

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// └── engine.yaml   # Thresholds, layout, dynamic window, billing, labels
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_extract::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Scanning {} rows", loader.config().detection.scan_rows);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/default")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `engine.yaml` is missing
    /// - The file contains invalid YAML
    /// - A value is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::load_file(path.as_ref().join(ENGINE_CONFIG_FILE))
    }

    /// Loads configuration from a single YAML file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let config = Self::load_yaml::<EngineConfig>(path)?;
        config.validate().map_err(|e| match e {
            EngineError::ConfigParseError { message, .. } => EngineError::ConfigParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PayrollField;
    use std::str::FromStr;

    use rust_decimal::Decimal;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
    }

    #[test]
    fn test_shipped_configuration_matches_defaults() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(loader.config(), &EngineConfig::default());
    }

    #[test]
    fn test_billing_multipliers_loaded_correctly() {
        let config = ConfigLoader::load(config_path()).unwrap().into_config();
        assert_eq!(config.billing.overtime_threshold_hours, dec("60"));
        assert_eq!(config.billing.overtime_multiplier, dec("1.25"));
        assert_eq!(config.billing.overtime_over_threshold_multiplier, dec("1.5"));
        assert_eq!(config.billing.night_multiplier, dec("0.25"));
        assert_eq!(config.billing.holiday_multiplier, dec("1.35"));
    }

    #[test]
    fn test_fallback_rows_loaded_correctly() {
        let config = ConfigLoader::load(config_path()).unwrap().into_config();
        assert_eq!(config.layout.fallback_rows[&PayrollField::EmployeeId], 3);
        assert_eq!(config.layout.fallback_rows[&PayrollField::GrossSalary], 30);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_invalid_yaml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ENGINE_CONFIG_FILE), "detection: [unclosed").unwrap();

        match ConfigLoader::load(dir.path()) {
            Err(EngineError::ConfigParseError { path, .. }) => {
                assert!(path.ends_with("engine.yaml"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_value_reports_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.yaml");
        fs::write(&file, "detection:\n  trust_threshold: 2.0\n").unwrap();

        match ConfigLoader::load_file(&file) {
            Err(EngineError::ConfigParseError { path, message }) => {
                assert!(path.ends_with("custom.yaml"));
                assert!(message.contains("trust_threshold"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engine.yaml");
        fs::write(&file, "extra_labels:\n  overtime_allowance: [\"残業\"]\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_file(&file),
            Err(EngineError::ConfigParseError { .. })
        ));
    }
}
