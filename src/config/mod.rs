pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{AppConfig, InjectorConfig, LoggingSettings, PartialAppConfig};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{CONFIG_FILE_NAME, ENV_LOG_FORMAT, ENV_LOG_LEVEL, USER_CONFIG_DIR};
