use std::fmt;

/// Result type for alfred-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during workflow evaluation
#[derive(Debug)]
pub enum Error {
    /// No edge exists for the attempted (state, trigger) pair
    InvalidTransition {
        state: String,
        trigger: String,
        valid_triggers: Vec<String>,
    },
    /// A workflow description violated the builder's shape rules
    Definition(String),
    /// A submitted artifact failed schema or cross-plan validation
    Validation(Vec<String>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTransition {
                state,
                trigger,
                valid_triggers,
            } => {
                if valid_triggers.is_empty() {
                    write!(f, "no transition '{}' from state '{}' (terminal state)", trigger, state)
                } else {
                    write!(
                        f,
                        "no transition '{}' from state '{}' (valid: {})",
                        trigger,
                        state,
                        valid_triggers.join(", ")
                    )
                }
            }
            Error::Definition(msg) => write!(f, "invalid workflow definition: {}", msg),
            Error::Validation(diagnostics) => {
                write!(f, "artifact validation failed: {}", diagnostics.join("; "))
            }
        }
    }
}

impl std::error::Error for Error {}
