//! Session configuration for ds3270
//!
//! A property bag keyed by dotted names, serialised as JSON. The session
//! reads its screen geometry, addressing mode, identity and default wait
//! timeout from here. Each session gets its own `SessionConfig`; there is
//! no process-wide instance.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::lib3270::addressing::{AddressingMode, ScreenGeometry};

pub const PROP_SESSION_ID: &str = "session.id";
pub const PROP_WAIT_TIMEOUT_MS: &str = "session.waitTimeoutMs";
pub const PROP_ROWS: &str = "terminal.rows";
pub const PROP_COLUMNS: &str = "terminal.columns";
pub const PROP_ADDRESSING: &str = "terminal.addressing";

const DEFAULT_WAIT_TIMEOUT_MS: i64 = 10_000;

/// Supported configuration value types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl ConfigValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Configuration of one terminal session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    properties: HashMap<String, ConfigValue>,
    session_name: String,
    config_resource: String,
}

impl SessionConfig {
    /// Create a configuration holding the default values
    pub fn new(config_resource: String, session_name: String) -> Self {
        let mut config = Self {
            properties: HashMap::new(),
            session_name,
            config_resource,
        };
        config.set_defaults();
        config
    }

    fn set_defaults(&mut self) {
        self.properties.insert(PROP_SESSION_ID.to_string(), uuid::Uuid::new_v4().to_string().into());
        self.properties.insert(PROP_WAIT_TIMEOUT_MS.to_string(), DEFAULT_WAIT_TIMEOUT_MS.into());
        self.properties.insert(PROP_ROWS.to_string(), 24i64.into());
        self.properties.insert(PROP_COLUMNS.to_string(), 80i64.into());
        self.properties.insert(PROP_ADDRESSING.to_string(), "auto".into());
    }

    /// Get configuration property as string
    pub fn get_string_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(|v| v.as_string().map(|s| s.to_string()))
    }

    /// Get configuration property as string with default
    pub fn get_string_property_or(&self, key: &str, default: &str) -> String {
        self.get_string_property(key).unwrap_or_else(|| default.to_string())
    }

    /// Get configuration property as integer
    pub fn get_int_property(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(|v| v.as_integer())
    }

    /// Get configuration property as integer with default
    pub fn get_int_property_or(&self, key: &str, default: i64) -> i64 {
        self.get_int_property(key).unwrap_or(default)
    }

    pub fn get_boolean_property(&self, key: &str) -> Option<bool> {
        self.properties.get(key).and_then(|v| v.as_boolean())
    }

    /// Set configuration property
    pub fn set_property<T: Into<ConfigValue>>(&mut self, key: &str, value: T) {
        self.properties.insert(key.to_string(), value.into());
    }

    pub fn remove_property(&mut self, key: &str) -> Option<ConfigValue> {
        self.properties.remove(key)
    }

    /// Session identity, generated when not configured
    pub fn session_id(&self) -> String {
        self.get_string_property_or(PROP_SESSION_ID, &self.session_name)
    }

    /// Default bound for session waits
    pub fn wait_timeout(&self) -> Duration {
        let millis = self.get_int_property_or(PROP_WAIT_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS);
        Duration::from_millis(millis.max(0) as u64)
    }

    fn dimension(&self, key: &str) -> ConfigResult<u16> {
        let value = self
            .get_int_property(key)
            .ok_or_else(|| ConfigError::MissingRequired { parameter: key.to_string() })?;
        u16::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| ConfigError::InvalidParameter {
                parameter: key.to_string(),
                value: value.to_string(),
                reason: "must be between 1 and 65535".to_string(),
            })
    }

    /// Screen geometry described by the terminal properties
    ///
    /// `terminal.addressing` is `auto`, `12bit` or `14bit`; `auto` picks
    /// 12-bit addressing whenever the buffer fits in 4096 cells.
    pub fn geometry(&self) -> ConfigResult<ScreenGeometry> {
        let rows = self.dimension(PROP_ROWS)?;
        let cols = self.dimension(PROP_COLUMNS)?;
        let addressing = self.get_string_property_or(PROP_ADDRESSING, "auto");
        match addressing.to_ascii_lowercase().as_str() {
            "auto" => ScreenGeometry::with_auto_mode(rows, cols),
            "12bit" => ScreenGeometry::new(rows, cols, AddressingMode::TwelveBit),
            "14bit" => ScreenGeometry::new(rows, cols, AddressingMode::FourteenBit),
            _ => Err(ConfigError::InvalidParameter {
                parameter: PROP_ADDRESSING.to_string(),
                value: addressing,
                reason: "expected auto, 12bit or 14bit".to_string(),
            }),
        }
    }

    /// Store rows, columns and addressing mode of a geometry
    pub fn set_geometry(&mut self, geometry: &ScreenGeometry) {
        self.set_property(PROP_ROWS, geometry.rows() as i64);
        self.set_property(PROP_COLUMNS, geometry.cols() as i64);
        let mode = match geometry.mode() {
            AddressingMode::TwelveBit => "12bit",
            AddressingMode::FourteenBit => "14bit",
        };
        self.set_property(PROP_ADDRESSING, mode);
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.properties)?)
    }

    /// Merge properties from JSON over the current values
    pub fn from_json(&mut self, json: &str) -> ConfigResult<()> {
        let loaded: HashMap<String, ConfigValue> = serde_json::from_str(json)?;
        self.properties.extend(loaded);
        Ok(())
    }

    /// Load a configuration file; properties it lacks keep their defaults
    pub fn load(path: &Path, session_name: String) -> ConfigResult<Self> {
        let mut config = Self::new(path.to_string_lossy().to_string(), session_name);
        let json = fs::read_to_string(path).map_err(|source| ConfigError::FileError {
            path: path.display().to_string(),
            source,
        })?;
        config.from_json(&json)?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save the configuration to its `config_resource` path
    pub fn save(&self) -> ConfigResult<()> {
        let path = PathBuf::from(&self.config_resource);
        let file_error = |source| ConfigError::FileError {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(file_error)?;
            }
        }
        fs::write(&path, self.to_json()?).map_err(file_error)?;
        Ok(())
    }
}

/// Default location of the session configuration file
///
/// `DS3270_CONFIG` overrides; otherwise `ds3270/session.json` under the
/// platform configuration directory, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DS3270_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("ds3270").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("session.json"))
}

/// Load the configuration at the default path, or defaults if there is
/// none or it cannot be read
pub fn load_default_config(session_name: String) -> SessionConfig {
    let path = default_config_path();
    if !path.exists() {
        return SessionConfig::new(path.to_string_lossy().to_string(), session_name);
    }
    match SessionConfig::load(&path, session_name.clone()) {
        Ok(config) => config,
        Err(e) => {
            warn!("ignoring configuration file {}: {}", path.display(), e);
            SessionConfig::new(path.to_string_lossy().to_string(), session_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("test.json".to_string(), "test".to_string())
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.get_int_property(PROP_ROWS), Some(24));
        assert_eq!(config.get_int_property(PROP_COLUMNS), Some(80));
        assert_eq!(config.wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.session_id().len(), 36);

        let geometry = config.geometry().unwrap();
        assert_eq!(geometry.buffer_size(), 1920);
        assert_eq!(geometry.mode(), AddressingMode::TwelveBit);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(config().session_id(), config().session_id());
    }

    #[test]
    fn test_auto_addressing_switches_for_large_screens() {
        let mut config = config();
        config.set_property(PROP_ROWS, 62i64);
        config.set_property(PROP_COLUMNS, 160i64);
        assert_eq!(config.geometry().unwrap().mode(), AddressingMode::FourteenBit);

        config.set_property(PROP_ADDRESSING, "12bit");
        assert!(config.geometry().is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = config();
        config.set_property(PROP_ADDRESSING, "16bit");
        assert!(matches!(config.geometry(), Err(ConfigError::InvalidParameter { .. })));

        let mut config = self::config();
        config.set_property(PROP_ROWS, -1i64);
        assert!(matches!(config.geometry(), Err(ConfigError::InvalidParameter { .. })));

        let mut config = self::config();
        config.remove_property(PROP_COLUMNS);
        assert!(matches!(config.geometry(), Err(ConfigError::MissingRequired { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let mut original = config();
        original.set_property(PROP_ROWS, 43i64);
        original.set_property("custom.flag", true);
        let json = original.to_json().unwrap();

        let mut restored = config();
        restored.from_json(&json).unwrap();
        assert_eq!(restored.get_int_property(PROP_ROWS), Some(43));
        assert_eq!(restored.get_boolean_property("custom.flag"), Some(true));
        assert_eq!(restored.session_id(), original.session_id());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let mut config = config();
        assert!(matches!(config.from_json("not json"), Err(ConfigError::Serialization(_))));
    }

    #[test]
    fn test_set_geometry() {
        let mut config = config();
        let geometry = ScreenGeometry::new(27, 132, AddressingMode::FourteenBit).unwrap();
        config.set_geometry(&geometry);
        assert_eq!(config.geometry().unwrap(), geometry);
    }
}
