//! The `submit_work` transition driver.
//!
//! Write ordering is fixed: validate, append turn, update manifest,
//! fire the transition, persist the task state. Each step is atomic
//! and a failure skips everything after it, so the log never records
//! work the state does not reflect.

use crate::context::Overlays;
use crate::runtime::Runtime;
use crate::{Error, Result};
use alfred_engine::{check_subtask_completion, normalize_artifact, submit_trigger, validate_artifact};
use alfred_store::{NewTurn, ScratchpadHeader};
use alfred_types::{ToolResponse, WorkflowState, context_keys};
use serde_json::{Value, json};
use tracing::info;

impl Runtime {
    /// Submit the current work state's artifact.
    pub fn submit_work(&self, task_id: &str, artifact: Value) -> ToolResponse {
        self.respond(self.try_submit_work(task_id, artifact))
    }

    fn try_submit_work(&self, task_id: &str, mut artifact: Value) -> Result<ToolResponse> {
        let task = self.resolve_task(task_id)?;
        let _lock = self.store().lock_task(task_id)?;
        let mut state = self.store().load_or_init_state(task_id)?;

        let workflow = state.active().ok_or_else(|| {
            Error::InvalidState(format!(
                "no workflow is active for task '{task_id}'; call work_on_task to find the owning tool"
            ))
        })?;
        let def = self
            .registry()
            .get(&workflow.tool_name)
            .and_then(|t| t.as_workflow())
            .ok_or_else(|| {
                Error::NotFound(format!("active tool '{}' is not registered", workflow.tool_name))
            })?;
        let machine = def.machine()?;
        let current = workflow.current_state.clone();

        if !def.is_work_state(&current) {
            return Err(Error::InvalidState(format!(
                "submit_work is only valid in a work state; task '{task_id}' is in '{current}' \
                 (valid triggers: {})",
                machine.valid_triggers(&current).join(", ")
            )));
        }

        // Validate before anything is written; a rejected artifact
        // leaves no trace beyond the error response.
        normalize_artifact(&mut artifact);
        if let Some(schema) = def.artifact_map.get(&current) {
            validate_artifact(schema, &artifact)?;
        }

        let latest = self.store().latest_artifacts_by_state(task_id)?;
        if let Some(handoff) = def.requires_artifact_from
            && artifact.get("completed_subtasks").is_some()
            && let Some(plan) = latest.get(handoff.state)
        {
            check_subtask_completion(plan, &artifact)?;
        }

        let workflow = state.active_mut().expect("checked above");
        let revision_of = workflow
            .context_u64(context_keys::REVISION_TURN_NUMBER)
            .map(|n| n as u32);
        let revision_feedback = workflow
            .context_str(context_keys::FEEDBACK_NOTES)
            .map(str::to_string);

        workflow.set_context(WorkflowState::artifact_key(&current), artifact.clone());
        workflow.set_context(context_keys::ARTIFACT_CONTENT, artifact.clone());
        workflow.set_context(context_keys::LAST_STATE, json!(current));

        let turn = self.store().append_turn(
            task_id,
            NewTurn::new(current.as_str(), workflow.tool_name.as_str(), artifact)
                .with_revision(revision_of, revision_feedback),
        )?;
        workflow.clear_context(context_keys::REVISION_TURN_NUMBER);
        workflow.clear_context(context_keys::FEEDBACK_NOTES);

        let next_state = machine.fire(&current, &submit_trigger(&current))?;
        workflow.current_state = next_state.clone();
        state.touch();
        self.store().save_state(&state)?;
        self.store().update_manifest_state(task_id, &next_state)?;
        self.store().regenerate_scratchpad(&ScratchpadHeader {
            task_id: task_id.to_string(),
            title: task.title.clone(),
            task_status: state.task_status.to_string(),
            current_state: next_state.clone(),
        })?;
        info!(task_id, state = %current, turn = turn.turn_number, "work submitted");

        let prompt = self.render_prompt(&task, &state, Overlays::default())?;
        Ok(ToolResponse::success(format!(
            "Recorded turn {} for '{current}'; task {task_id} is now in '{next_state}'.",
            turn.turn_number
        ))
        .with_data(json!({
            "turn_number": turn.turn_number,
            "current_state": next_state,
            "revision_of": turn.revision_of,
        }))
        .with_prompt(prompt))
    }
}
