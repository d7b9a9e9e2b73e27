//! Argument types for the MCP tool surface.
//!
//! Each struct derives `JsonSchema` so the server's `tools/list`
//! response and the deserialization path share one source of truth.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments for tools that operate on one task.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskIdArgs {
    /// Task identifier, e.g. "AL-01".
    pub task_id: String,
}

/// Arguments for `submit_work`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubmitWorkArgs {
    /// Task identifier, e.g. "AL-01".
    pub task_id: String,
    /// The artifact for the current work state. Validated against that
    /// state's schema before any transition fires.
    pub artifact: Value,
}

/// Arguments for `request_revision`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RequestRevisionArgs {
    /// Task identifier, e.g. "AL-01".
    pub task_id: String,
    /// What must change before the artifact can be approved.
    pub feedback_notes: String,
}

/// Arguments for `mark_subtask_complete`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkSubtaskCompleteArgs {
    /// Task identifier, e.g. "AL-01".
    pub task_id: String,
    /// One of the subtask ids from the implementation plan.
    pub subtask_id: String,
}

/// Arguments for `create_task`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskArgs {
    /// Optional task id; must match the id declared in `content`.
    #[serde(default)]
    pub task_id: Option<String>,
    /// Full task file content, starting with `# TASK: {task_id}`.
    pub content: String,
}

/// Arguments for `get_next_task` (none).
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetNextTaskArgs {}
