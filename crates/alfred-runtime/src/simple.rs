//! Builtin simple tools: single functions with no state machine.
//!
//! Simple tools are read-mostly and take no task lock; the only write
//! here (`create_task`) touches the task definition file, never the
//! lock-guarded TaskState.

use crate::runtime::{Runtime, required_str_arg};
use crate::{Error, Result};
use alfred_providers::parser;
use alfred_types::ToolResponse;
use serde_json::{Value, json};

/// Route to the tool owning the task's current status. Advisory only:
/// nothing transitions.
pub(crate) fn work_on_task(runtime: &Runtime, args: &Value) -> Result<ToolResponse> {
    let task_id = required_str_arg(args, "task_id")?;
    let task = runtime.resolve_task(task_id)?;

    if task.task_status.is_terminal() {
        return Ok(ToolResponse::success(format!(
            "Task {task_id} is done; nothing left to run."
        ))
        .with_data(json!({"task_status": task.task_status})));
    }

    let owner = runtime
        .registry()
        .tool_for_status(task.task_status)
        .ok_or_else(|| {
            Error::Registry(format!(
                "no tool owns status '{}'; the builtin table is miscurated",
                task.task_status
            ))
        })?;

    Ok(ToolResponse::success(format!(
        "Task {task_id} is at status '{}'. Invoke '{}' to continue.",
        task.task_status, owner.name
    ))
    .with_data(json!({
        "tool_name": owner.name,
        "task_status": task.task_status,
    })))
}

/// Ranked recommendation across all non-done tasks.
pub(crate) fn get_next_task(runtime: &Runtime, _args: &Value) -> Result<ToolResponse> {
    Ok(runtime.provider().get_next_task()?)
}

/// Create a task definition file from markdown content.
pub(crate) fn create_task(runtime: &Runtime, args: &Value) -> Result<ToolResponse> {
    let content = required_str_arg(args, "content")?;
    let task = parser::parse_task_file("create_task", content)?;

    if let Some(requested) = args.get("task_id").and_then(Value::as_str)
        && requested != task.task_id
    {
        return Err(Error::InvalidState(format!(
            "content declares task id '{}' but '{requested}' was requested",
            task.task_id
        )));
    }

    let tasks_root = runtime.tasks_root();
    let path = tasks_root.join(format!("{}.md", task.task_id));
    if path.exists() {
        return Err(Error::InvalidState(format!(
            "task '{}' already exists at {}",
            task.task_id,
            path.display()
        )));
    }

    std::fs::create_dir_all(&tasks_root)
        .and_then(|_| std::fs::write(&path, parser::render_task_file(&task)))
        .map_err(|e| Error::Config(format!("cannot write {}: {e}", path.display())))?;

    Ok(ToolResponse::success(format!(
        "Created task {} at {}. Run work_on_task to start it.",
        task.task_id,
        path.display()
    ))
    .with_data(json!({"task_id": task.task_id, "path": path.display().to_string()})))
}
