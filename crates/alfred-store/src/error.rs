use std::fmt;

/// Result type for alfred-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),
    /// A persisted record failed to parse (corrupt or hand-edited file)
    Corrupt { path: String, source: serde_json::Error },
    /// A record failed to serialize
    Serialization(serde_json::Error),
    /// Another invocation holds the task's advisory lock
    LockContention { task_id: String },
    /// Task id is not safe to use as a directory name
    InvalidTaskId(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Corrupt { path, source } => {
                write!(f, "corrupt record at {}: {}", path, source)
            }
            Error::Serialization(err) => write!(f, "Serialization error: {}", err),
            Error::LockContention { task_id } => write!(
                f,
                "task '{}' is locked by another invocation; retry once it finishes",
                task_id
            ),
            Error::InvalidTaskId(id) => write!(
                f,
                "task id '{}' contains path separators or dot segments and cannot name a task directory",
                id
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Corrupt { source, .. } => Some(source),
            Error::Serialization(err) => Some(err),
            Error::LockContention { .. } | Error::InvalidTaskId(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
