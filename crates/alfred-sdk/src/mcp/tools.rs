//! Tool dispatch for the MCP server.

use crate::Client;
use crate::query::{
    CreateTaskArgs, MarkSubtaskCompleteArgs, RequestRevisionArgs, SubmitWorkArgs, TaskIdArgs,
};
use alfred_types::ToolResponse;
use serde_json::{Value, json};

/// Workflow entry points that take only a task id and are dispatched
/// straight through the generic handler.
pub(crate) const TASK_TOOLS: [(&str, &str); 8] = [
    ("work_on_task", "Route to the tool owning the task's current status. Call this first when unsure what to do with a task."),
    ("plan_task", "Enter the planning workflow: discovery, clarification, contracts, implementation plan, validation."),
    ("implement_task", "Enter the implementation workflow. Requires a completed plan."),
    ("review_task", "Enter the review workflow over the implementation manifest."),
    ("test_task", "Enter the testing workflow verifying every acceptance criterion."),
    ("finalize_task", "Enter the finalization workflow and close the task out."),
    ("create_spec", "Enter the spec-authoring workflow for raw product requirements."),
    ("create_tasks_from_spec", "Break a completed specification into ordered tasks."),
];

pub(crate) fn handle_task_tool(
    client: &Client,
    tool_name: &str,
    args: TaskIdArgs,
) -> Result<Value, String> {
    let response = client.invoke_tool(tool_name, &json!({"task_id": args.task_id}));
    to_value(response)
}

pub(crate) fn handle_get_next_task(client: &Client) -> Result<Value, String> {
    to_value(client.get_next_task())
}

pub(crate) fn handle_submit_work(client: &Client, args: SubmitWorkArgs) -> Result<Value, String> {
    to_value(client.submit_work(&args.task_id, args.artifact))
}

pub(crate) fn handle_approve_review(client: &Client, args: TaskIdArgs) -> Result<Value, String> {
    to_value(client.approve_review(&args.task_id))
}

pub(crate) fn handle_request_revision(
    client: &Client,
    args: RequestRevisionArgs,
) -> Result<Value, String> {
    to_value(client.request_revision(&args.task_id, &args.feedback_notes))
}

pub(crate) fn handle_approve_and_advance(
    client: &Client,
    args: TaskIdArgs,
) -> Result<Value, String> {
    to_value(client.approve_and_advance(&args.task_id))
}

pub(crate) fn handle_mark_subtask_complete(
    client: &Client,
    args: MarkSubtaskCompleteArgs,
) -> Result<Value, String> {
    to_value(client.mark_subtask_complete(&args.task_id, &args.subtask_id))
}

pub(crate) fn handle_create_task(client: &Client, args: CreateTaskArgs) -> Result<Value, String> {
    let response = client.invoke_tool(
        "create_task",
        &json!({"task_id": args.task_id, "content": args.content}),
    );
    to_value(response)
}

fn to_value(response: ToolResponse) -> Result<Value, String> {
    serde_json::to_value(&response).map_err(|e| format!("response serialization failed: {e}"))
}
