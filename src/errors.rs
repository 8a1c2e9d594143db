use thiserror::Error;

/// Errors raised by the injector while registering or resolving services and commands.
#[derive(Debug, Error)]
pub enum InjectorError {
    #[error("Unable to resolve '{0}': no registration found")]
    UnresolvedName(String),
    #[error("Module '{name}' is already required from '{existing}' (attempted '{attempted}')")]
    DuplicateRequire {
        name: String,
        existing: String,
        attempted: String,
    },
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },
    #[error("Command '{parent}' already has default sub-command '{existing}', cannot add '{attempted}'")]
    AmbiguousDefaultCommand {
        parent: String,
        existing: String,
        attempted: String,
    },
    #[error("Failed to load module '{path}': {reason}")]
    ModuleLoad { path: String, reason: String },
    #[error("Service '{name}' is not of the expected type '{expected}'")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("Failed to create service '{service}': {reason}")]
    CreationFailed { service: String, reason: String },
    #[error("Invalid command name '{0}'")]
    InvalidCommandName(String),
}

impl InjectorError {
    /// Shorthand for constructors that fail for their own reasons.
    pub fn creation(service: impl Into<String>, reason: impl ToString) -> Self {
        InjectorError::CreationFailed {
            service: service.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Other Config Error: {0}")]
    Other(String),
}

/// Errors surfaced while turning command line tokens into a running command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown command '{0}'. Run 'wirebox help' to list available commands")]
    UnknownCommand(String),
    #[error("The input is not a valid sub-command for '{root}'. Available: {}", available.join(", "))]
    InvalidSubCommand { root: String, available: Vec<String> },
    #[error("Command '{0}' cannot be executed with the given arguments")]
    CannotExecute(String),
    #[error("Command '{0}' is not executable")]
    NotACommand(String),
    #[error(transparent)]
    Injector(#[from] InjectorError),
}
