//! Core domain model shared by every alfred crate.
//!
//! This crate holds only schemas and small helpers over them; all
//! behavior (state machines, persistence, routing) lives in the layers
//! above. Keeping the model dependency-free makes replay and testing
//! of the higher layers trivial.

mod error;
mod response;
mod state;
mod status;
mod task;
mod turn;

pub use error::{Error, Result};
pub use response::{ResponseStatus, ToolResponse};
pub use state::{TaskState, WorkflowState, context_keys};
pub use status::TaskStatus;
pub use task::{Task, TaskPriority};
pub use turn::{REVISION_REQUEST_STATE, TaskManifest, Turn};

/// Produce an RFC 3339 UTC timestamp for persisted records.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
