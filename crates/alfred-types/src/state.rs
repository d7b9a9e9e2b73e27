use crate::{TaskStatus, now_rfc3339};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known keys inside [`WorkflowState::context_store`].
///
/// The context store is schemaless by design; these constants are the
/// read-site contract for the handful of keys the engine itself manages.
pub mod context_keys {
    /// The artifact currently under review (mirror of the latest
    /// `{state}_artifact` entry, or a cross-tool handoff payload).
    pub const ARTIFACT_CONTENT: &str = "artifact_content";
    /// Reviewer feedback carried into the next submission.
    pub const FEEDBACK_NOTES: &str = "feedback_notes";
    /// Turn number of the pending revision request, linked by the next
    /// submission's `revision_of`.
    pub const REVISION_TURN_NUMBER: &str = "revision_turn_number";
    /// Sorted set of finished subtask ids inside the implementation phase.
    pub const COMPLETED_SUBTASKS: &str = "completed_subtasks";
    /// Per-task override of the global autonomous mode.
    pub const AUTONOMOUS_MODE: &str = "autonomous_mode";
    /// The work state that produced the most recent submission.
    pub const LAST_STATE: &str = "last_state";
}

/// Per-tool workflow position for one task.
///
/// Created when a workflow tool first touches a task, cleared when the
/// tool reaches its terminal state. At most one exists per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub task_id: String,
    pub tool_name: String,
    pub current_state: String,
    #[serde(default)]
    pub context_store: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl WorkflowState {
    pub fn new(task_id: impl Into<String>, tool_name: impl Into<String>, initial_state: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            task_id: task_id.into(),
            tool_name: tool_name.into(),
            current_state: initial_state.into(),
            context_store: Map::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Key under which a work state's most recent artifact is stored.
    pub fn artifact_key(state: &str) -> String {
        format!("{state}_artifact")
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: Value) {
        self.context_store.insert(key.into(), value);
        self.updated_at = now_rfc3339();
    }

    pub fn clear_context(&mut self, key: &str) {
        self.context_store.remove(key);
        self.updated_at = now_rfc3339();
    }

    pub fn context(&self, key: &str) -> Option<&Value> {
        self.context_store.get(key)
    }

    /// Typed read of a string-valued context entry.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context_store.get(key).and_then(Value::as_str)
    }

    /// Typed read of an integer-valued context entry.
    pub fn context_u64(&self, key: &str) -> Option<u64> {
        self.context_store.get(key).and_then(Value::as_u64)
    }

    /// Typed read of a string-list context entry (missing key reads as empty).
    pub fn context_str_list(&self, key: &str) -> Vec<String> {
        self.context_store
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The persisted per-task record, authoritative for status and workflow
/// position. Serialized as `task_state.json` inside the task directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    pub task_id: String,
    pub task_status: TaskStatus,
    #[serde(default)]
    pub active_tool_state: Option<WorkflowState>,
    #[serde(default)]
    pub completed_tool_outputs: Map<String, Value>,
    pub updated_at: String,
}

impl TaskState {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_status: TaskStatus::New,
            active_tool_state: None,
            completed_tool_outputs: Map::new(),
            updated_at: now_rfc3339(),
        }
    }

    /// The active workflow, or an error message suitable for a
    /// ToolResponse when none is in progress.
    pub fn active(&self) -> Option<&WorkflowState> {
        self.active_tool_state.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut WorkflowState> {
        self.active_tool_state.as_mut()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}
