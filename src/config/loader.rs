use std::{collections::HashMap, env, fs, path::PathBuf};

use super::app_config::{
    AppConfig, PartialAppConfig, CONFIG_FILE_NAME, ENV_LOG_FORMAT, ENV_LOG_LEVEL, USER_CONFIG_DIR,
};
use crate::errors::ConfigError;

/// Configuration loader responsible for loading config from files and environment
#[derive(Debug, Default)]
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
            explicit_file: None,
        }
    }

    /// Load from an explicit file; `~` is expanded
    pub fn with_file(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            base_path: None,
            explicit_file: Some(PathBuf::from(expanded.as_ref())),
        }
    }

    /// Location of the configuration file this loader reads
    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(file) = &self.explicit_file {
            return Ok(file.clone());
        }
        let base = match &self.base_path {
            Some(base) => base.clone(),
            None => dirs::config_dir()
                .ok_or_else(|| ConfigError::Other("Unable to locate config directory".to_string()))?,
        };
        Ok(base.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load complete application configuration
    ///
    /// A missing default file means defaults; a missing explicit file is an error.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let config_path = self.config_path()?;
        let partial = if config_path.exists() || self.explicit_file.is_some() {
            Some(self.load_partial_config(&config_path)?)
        } else {
            tracing::debug!(path = %config_path.display(), "no configuration file, using defaults");
            None
        };

        AppConfig::from_partial_and_env(partial, self.collect_env_vars())
    }

    fn load_partial_config(&self, path: &PathBuf) -> Result<PartialAppConfig, ConfigError> {
        let display = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(display.clone(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse(display, e))
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        [ENV_LOG_LEVEL, ENV_LOG_FORMAT]
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
        let config = loader.load_config().unwrap();
        assert_eq!(config.injector, super::super::InjectorConfig::default());
    }

    #[test]
    fn reads_file_under_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(USER_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join(CONFIG_FILE_NAME),
            "[injector]\ndependency_sigil = \"@\"\n",
        )
        .unwrap();

        let config = ConfigLoader::with_base_path(dir.path().to_path_buf())
            .load_config()
            .unwrap();
        assert_eq!(config.injector.dependency_sigil, '@');
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = ConfigLoader::with_file(path.to_str().unwrap())
            .load_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[injector\n").unwrap();
        let err = ConfigLoader::with_file(path.to_str().unwrap())
            .load_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(..)));
    }
}
