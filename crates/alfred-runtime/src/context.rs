//! Prompt context assembly.
//!
//! Collects everything a prompt template may reference into one JSON
//! object: task fields, the active tool's identity and context store,
//! the latest artifact per state (whole and flattened per field), and
//! any one-shot overlays from the caller. The assembler knows nothing
//! about how templates are found; it only produces data.

use alfred_types::{Task, WorkflowState, context_keys};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

const SUMMARY_MAX_CHARS: usize = 200;

/// One-shot values layered on top of the assembled context.
#[derive(Debug, Default)]
pub struct Overlays {
    pub artifact_content: Option<Value>,
    pub feedback_notes: Option<String>,
}

/// Assemble the rendering context for `(task, workflow)` plus the
/// latest-artifact view of the turn log.
pub fn build_context(
    task: &Task,
    workflow: &WorkflowState,
    latest_artifacts: &BTreeMap<String, Value>,
    overlays: Overlays,
) -> Value {
    let mut ctx = Map::new();

    // 1. Task fields
    ctx.insert("task_id".to_string(), json!(task.task_id));
    ctx.insert("title".to_string(), json!(task.title));
    ctx.insert("context".to_string(), json!(task.context));
    ctx.insert(
        "implementation_details".to_string(),
        json!(task.implementation_details),
    );
    ctx.insert(
        "acceptance_criteria".to_string(),
        json!(task.acceptance_criteria),
    );
    ctx.insert(
        "ac_verification_steps".to_string(),
        json!(task.ac_verification_steps),
    );
    if let Some(notes) = &task.dev_notes {
        ctx.insert("dev_notes".to_string(), json!(notes));
    }
    ctx.insert("task_status".to_string(), json!(task.task_status));

    // 2. Active tool identity
    ctx.insert("tool_name".to_string(), json!(workflow.tool_name));
    ctx.insert("current_state".to_string(), json!(workflow.current_state));

    // 3. The whole context store
    for (key, value) in &workflow.context_store {
        ctx.insert(key.clone(), value.clone());
    }

    // 4. Latest artifact per state, whole and flattened
    for (state, artifact) in latest_artifacts {
        ctx.insert(state.clone(), artifact.clone());
        if let Value::Object(fields) = artifact {
            for (field, value) in fields {
                ctx.insert(format!("{state}_{field}"), value.clone());
            }
        }
    }

    // 5. Caller overlays win over everything
    if let Some(artifact) = overlays.artifact_content {
        ctx.insert(context_keys::ARTIFACT_CONTENT.to_string(), artifact);
    }
    if let Some(feedback) = overlays.feedback_notes {
        ctx.insert(context_keys::FEEDBACK_NOTES.to_string(), json!(feedback));
    }

    // Review states get a short summary of the artifact under review.
    if alfred_engine::parse_review_state(&workflow.current_state).is_some() {
        let summary = ctx
            .get(context_keys::ARTIFACT_CONTENT)
            .map(summarize_artifact)
            .unwrap_or_default();
        ctx.insert("artifact_summary".to_string(), json!(summary));
    }

    Value::Object(ctx)
}

/// Title or summary field when present, else a truncated serialization.
fn summarize_artifact(artifact: &Value) -> String {
    for key in ["title", "summary"] {
        if let Some(text) = artifact.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    let serialized = artifact.to_string();
    if serialized.chars().count() <= SUMMARY_MAX_CHARS {
        serialized
    } else {
        let truncated: String = serialized.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{truncated}…")
    }
}
