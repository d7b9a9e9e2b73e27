use crate::Result;
use alfred_runtime::{Runtime, resolve_workspace_root};
use alfred_types::ToolResponse;
use serde_json::{Value, json};
use std::path::Path;

/// Facade over one alfred workspace.
///
/// All operations are synchronous and return [`ToolResponse`]; every
/// expected failure is already folded into an error response by the
/// runtime, so callers only see `Err` for setup problems.
pub struct Client {
    runtime: Runtime,
}

impl Client {
    /// Connect to an explicit workspace root.
    pub fn connect(workspace_root: &Path) -> Result<Self> {
        let runtime = Runtime::open(workspace_root)?;
        Ok(Self { runtime })
    }

    /// Connect using the default resolution: `ALFRED_PATH`, falling
    /// back to `.alfred` in the current directory.
    pub fn connect_default() -> Result<Self> {
        Self::connect(&resolve_workspace_root(None))
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Invoke a registered tool (workflow entry points and simple
    /// tools) by name.
    pub fn invoke_tool(&self, tool_name: &str, args: &Value) -> ToolResponse {
        self.runtime.invoke_tool(tool_name, args)
    }

    pub fn work_on_task(&self, task_id: &str) -> ToolResponse {
        self.runtime
            .invoke_tool("work_on_task", &json!({"task_id": task_id}))
    }

    pub fn get_next_task(&self) -> ToolResponse {
        self.runtime.invoke_tool("get_next_task", &json!({}))
    }

    pub fn submit_work(&self, task_id: &str, artifact: Value) -> ToolResponse {
        self.runtime.submit_work(task_id, artifact)
    }

    pub fn approve_review(&self, task_id: &str) -> ToolResponse {
        self.runtime.approve_review(task_id)
    }

    pub fn request_revision(&self, task_id: &str, feedback_notes: &str) -> ToolResponse {
        self.runtime.request_revision(task_id, feedback_notes)
    }

    pub fn approve_and_advance(&self, task_id: &str) -> ToolResponse {
        self.runtime.approve_and_advance(task_id)
    }

    pub fn mark_subtask_complete(&self, task_id: &str, subtask_id: &str) -> ToolResponse {
        self.runtime.mark_subtask_complete(task_id, subtask_id)
    }
}
