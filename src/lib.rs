pub mod cli;
pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::{ConfigError, DispatchError, InjectorError};
pub use infrastructure::{
    CommandSource, Constructor, Dependencies, Descriptor, Disposable, ExtraArgs, Injector,
    InjectorHandle, Instance, ModuleLoader, StaticModuleLoader,
};
