use std::fmt;

/// Result type for alfred-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer.
///
/// Every variant maps to an error ToolResponse at the handler
/// boundary; nothing here crosses the MCP edge as a panic.
#[derive(Debug)]
pub enum Error {
    /// Task, tool or template could not be found
    NotFound(String),
    /// The call is not legal in the task's current state
    InvalidState(String),
    /// Engine-level failure: invalid transition or artifact validation
    Engine(alfred_engine::Error),
    /// Store-level failure: IO, corrupt records, lock contention
    Store(alfred_store::Error),
    /// Provider-level failure
    Provider(alfred_providers::Error),
    /// Prompt template missing or failed to render
    Template(String),
    /// Configuration file invalid
    Config(String),
    /// The builtin tool table violated its shape invariants
    Registry(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::Engine(err) => write!(f, "{}", err),
            Error::Store(err) => write!(f, "{}", err),
            Error::Provider(err) => write!(f, "{}", err),
            Error::Template(msg) => write!(f, "Template error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Registry(msg) => write!(f, "Tool registry error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(err) => Some(err),
            Error::Store(err) => Some(err),
            Error::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<alfred_engine::Error> for Error {
    fn from(err: alfred_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<alfred_store::Error> for Error {
    fn from(err: alfred_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<alfred_providers::Error> for Error {
    fn from(err: alfred_providers::Error) -> Self {
        Error::Provider(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
