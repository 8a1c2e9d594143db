use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ConfigError;
use crate::logging::LogFormat;

// Configuration location constants
pub const USER_CONFIG_DIR: &str = "wirebox";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment overrides
pub const ENV_LOG_LEVEL: &str = "WIREBOX_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "WIREBOX_LOG_FORMAT";

/// Main Application Configuration
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    pub injector: InjectorConfig,
    pub logging: LoggingSettings,
}

/// Behaviour switches for the injector itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InjectorConfig {
    /// Leading character stripped from declared dependency names.
    pub dependency_sigil: char,
    /// Let a second `require` of the same name replace the first one.
    pub allow_require_override: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            dependency_sigil: '$',
            allow_require_override: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    injector: Option<PartialInjectorConfig>,
    logging: Option<PartialLoggingSettings>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialInjectorConfig {
    dependency_sigil: Option<char>,
    allow_require_override: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialLoggingSettings {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load configuration from the default location and environment
    pub fn load() -> Result<Self, ConfigError> {
        super::ConfigLoader::new().load_config()
    }

    /// Create AppConfig from partial config and environment.
    ///
    /// Environment values win over file values, file values over defaults.
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let defaults = AppConfig::default();

        let injector = match partial.injector {
            Some(p) => InjectorConfig {
                dependency_sigil: p
                    .dependency_sigil
                    .unwrap_or(defaults.injector.dependency_sigil),
                allow_require_override: p
                    .allow_require_override
                    .unwrap_or(defaults.injector.allow_require_override),
            },
            None => defaults.injector,
        };

        let file_logging = partial.logging.unwrap_or_default();
        let level = env_map
            .get(ENV_LOG_LEVEL)
            .cloned()
            .or(file_logging.level)
            .unwrap_or(defaults.logging.level);
        let format = match env_map.get(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse::<LogFormat>().map_err(ConfigError::Other)?,
            None => file_logging.format.unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            injector,
            logging: LoggingSettings { level, format },
        })
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
