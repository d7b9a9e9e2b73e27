//! The review-side transition drivers: `provide_review`,
//! `approve_and_advance` and `mark_subtask_complete`.

use crate::context::Overlays;
use crate::runtime::Runtime;
use crate::{Error, Result};
use alfred_engine::{
    ReviewKind, TRIGGER_AI_APPROVE, TRIGGER_HUMAN_APPROVE, TRIGGER_REQUEST_REVISION,
    parse_review_state,
};
use alfred_store::NewTurn;
use alfred_types::{
    REVISION_REQUEST_STATE, TaskState, ToolResponse, WorkflowState, context_keys,
};
use serde_json::{Value, json};
use tracing::info;

impl Runtime {
    /// Approve the pending review for a task.
    pub fn approve_review(&self, task_id: &str) -> ToolResponse {
        self.respond(self.provide_review(task_id, true, None))
    }

    /// Reject the pending review, sending the workflow back to the
    /// work state with feedback.
    pub fn request_revision(&self, task_id: &str, feedback_notes: &str) -> ToolResponse {
        self.respond(self.provide_review(task_id, false, Some(feedback_notes.to_string())))
    }

    /// The shared review driver. The only way out of a review state is
    /// one of `ai_approve`, `human_approve` or `request_revision`.
    fn provide_review(
        &self,
        task_id: &str,
        is_approved: bool,
        feedback_notes: Option<String>,
    ) -> Result<ToolResponse> {
        let task = self.resolve_task(task_id)?;
        let _lock = self.store().lock_task(task_id)?;
        let mut state = self.store().load_or_init_state(task_id)?;

        let workflow = state.active().ok_or_else(|| {
            Error::InvalidState(format!("no workflow is active for task '{task_id}'"))
        })?;
        let current = workflow.current_state.clone();
        let tool_name = workflow.tool_name.clone();
        let review = parse_review_state(&current);

        let def = self
            .registry()
            .get(&tool_name)
            .and_then(|t| t.as_workflow())
            .ok_or_else(|| Error::NotFound(format!("active tool '{tool_name}' is not registered")))?;
        let machine = def.machine()?;

        if !is_approved {
            // Rejection is also legal from a work state: the
            // request_revision self-loop supports iterative refinement
            // before anything was submitted.
            if review.is_none() && !def.is_work_state(&current) {
                return Err(Error::InvalidState(format!(
                    "request_revision applies to review and work states; task '{task_id}' is in '{current}'"
                )));
            }
            return self.reject(task_id, &task, state, def, &machine, review.map(|(_, k)| k), feedback_notes);
        }

        let (_base, kind) = review.ok_or_else(|| {
            Error::InvalidState(format!(
                "approvals apply only to review states; task '{task_id}' is in '{current}'"
            ))
        })?;

        let workflow = state.active_mut().expect("checked above");
        workflow.clear_context(context_keys::FEEDBACK_NOTES);

        let new_state = match kind {
            ReviewKind::Ai => {
                let after_ai = machine.fire(&current, TRIGGER_AI_APPROVE)?;
                if self.autonomous_mode(workflow) {
                    // Autonomous runs skip the human gate: the edge out
                    // of the just-entered human review state exists by
                    // construction.
                    machine.fire(&after_ai, TRIGGER_HUMAN_APPROVE)?
                } else {
                    after_ai
                }
            }
            ReviewKind::Human => machine.fire(&current, TRIGGER_HUMAN_APPROVE)?,
        };
        workflow.current_state = new_state.clone();
        info!(task_id, from = %current, to = %new_state, "review approved");

        if machine.is_terminal(&new_state) {
            return self.complete_workflow(task_id, &task, state, def, new_state);
        }

        state.touch();
        self.store().save_state(&state)?;
        self.store().update_manifest_state(task_id, &new_state)?;

        let prompt = self.render_prompt(&task, &state, Overlays::default())?;
        let message = match parse_review_state(&new_state) {
            Some((_, ReviewKind::Human)) => format!(
                "AI review approved; task {task_id} awaits human review in '{new_state}'."
            ),
            _ => format!("Review approved; task {task_id} moved to '{new_state}'."),
        };
        Ok(ToolResponse::success(message)
            .with_data(json!({"current_state": new_state}))
            .with_prompt(prompt))
    }

    fn reject(
        &self,
        task_id: &str,
        task: &alfred_types::Task,
        mut state: TaskState,
        def: &crate::WorkflowDef,
        machine: &alfred_engine::StateMachine,
        kind: Option<ReviewKind>,
        feedback_notes: Option<String>,
    ) -> Result<ToolResponse> {
        let workflow = state.active_mut().expect("caller checked");
        let current = workflow.current_state.clone();
        let base = parse_review_state(&current).map(|(b, _)| b.to_string()).unwrap_or(current.clone());

        let feedback = feedback_notes.unwrap_or_default();
        if !feedback.is_empty() {
            let meta = self.store().append_turn(
                task_id,
                NewTurn::new(
                    REVISION_REQUEST_STATE,
                    workflow.tool_name.as_str(),
                    json!({
                        "state_to_revise": base,
                        "feedback": feedback,
                        "requested_by": kind.map_or("self", |k| k.as_str()),
                    }),
                ),
            )?;
            workflow.set_context(context_keys::REVISION_TURN_NUMBER, json!(meta.turn_number));
            workflow.set_context(context_keys::FEEDBACK_NOTES, json!(feedback));
        }

        let new_state = machine.fire(&current, TRIGGER_REQUEST_REVISION)?;
        workflow.current_state = new_state.clone();
        state.touch();
        self.store().save_state(&state)?;
        self.store().update_manifest_state(task_id, &new_state)?;
        info!(task_id, from = %current, to = %new_state, "revision requested");

        let prompt = self.render_prompt(task, &state, Overlays::default())?;
        Ok(ToolResponse::success(format!(
            "Revision requested for task {task_id}; back to '{new_state}' in {}.",
            def.name
        ))
        .with_data(json!({"current_state": new_state}))
        .with_prompt(prompt))
    }

    /// Terminal-state bookkeeping: harvest the final artifact, clear
    /// the workflow, assign the exit status.
    fn complete_workflow(
        &self,
        task_id: &str,
        task: &alfred_types::Task,
        mut state: TaskState,
        def: &crate::WorkflowDef,
        terminal_state: String,
    ) -> Result<ToolResponse> {
        let workflow = state.active_mut().expect("caller checked");
        let final_state = def.final_work_state().to_string();
        let output = workflow
            .context(&WorkflowState::artifact_key(&final_state))
            .cloned()
            .unwrap_or(Value::Null);
        let rendered_workflow = WorkflowState {
            current_state: terminal_state.clone(),
            ..workflow.clone()
        };

        if def.produces_artifacts {
            state
                .completed_tool_outputs
                .insert(def.name.to_string(), output);
        }
        state.active_tool_state = None;
        state.task_status = def.exit_status;
        self.provider().update_task_status(task_id, def.exit_status)?;

        state.touch();
        self.store().save_state(&state)?;
        self.store().update_manifest_state(task_id, &terminal_state)?;
        info!(task_id, tool = def.name, status = %def.exit_status, "workflow completed");

        let prompt = self.render_prompt_for(task, &state, &rendered_workflow, Overlays::default())?;
        let message = if def.exit_status.is_terminal() {
            format!("Task {task_id} completed the whole pipeline; status is 'done'.")
        } else {
            let next = self
                .registry()
                .tool_for_status(def.exit_status)
                .map(|d| d.name)
                .unwrap_or("work_on_task");
            format!(
                "Phase {} finished; task {task_id} is now '{}'. Continue with '{next}'.",
                def.name, def.exit_status
            )
        };
        Ok(ToolResponse::success(message)
            .with_data(json!({
                "task_status": def.exit_status,
                "terminal_state": terminal_state,
                "workflow_complete": def.exit_status.is_terminal(),
            }))
            .with_prompt(prompt))
    }

    /// Move on after a phase completed. Refuses while sub-states of
    /// the active workflow remain un-traversed.
    pub fn approve_and_advance(&self, task_id: &str) -> ToolResponse {
        self.respond(self.try_approve_and_advance(task_id))
    }

    fn try_approve_and_advance(&self, task_id: &str) -> Result<ToolResponse> {
        let _task = self.resolve_task(task_id)?;
        let _lock = self.store().lock_task(task_id)?;
        let state = self.store().load_or_init_state(task_id)?;

        if let Some(workflow) = state.active() {
            let def = self
                .registry()
                .get(&workflow.tool_name)
                .and_then(|t| t.as_workflow())
                .ok_or_else(|| {
                    Error::NotFound(format!("active tool '{}' is not registered", workflow.tool_name))
                })?;
            let machine = def.machine()?;
            if !machine.is_terminal(&workflow.current_state) {
                let base = parse_review_state(&workflow.current_state)
                    .map(|(b, _)| b)
                    .unwrap_or(workflow.current_state.as_str());
                let remaining: Vec<&str> = def
                    .work_states
                    .iter()
                    .map(String::as_str)
                    .skip_while(|w| *w != base)
                    .collect();
                return Err(Error::InvalidState(format!(
                    "'{}' still has un-traversed states for task '{task_id}': {} \
                     (currently in '{}'); finish them with submit_work and approve_review",
                    def.name,
                    remaining.join(", "),
                    workflow.current_state
                )));
            }
        }

        if state.task_status.is_terminal() {
            return Ok(ToolResponse::success(format!(
                "Task {task_id} is done; there is no next phase."
            )));
        }

        let next = self
            .registry()
            .tool_for_status(state.task_status)
            .ok_or_else(|| {
                Error::Registry(format!("no tool owns status '{}'", state.task_status))
            })?;
        Ok(ToolResponse::success(format!(
            "Task {task_id} is ready for '{}' (status '{}'). Invoke it to enter the next phase.",
            next.name, state.task_status
        ))
        .with_data(json!({"tool_name": next.name, "task_status": state.task_status})))
    }

    /// Progress tracking inside the implementation phase. No state
    /// transition and no turn; just the completed-subtask set.
    pub fn mark_subtask_complete(&self, task_id: &str, subtask_id: &str) -> ToolResponse {
        self.respond(self.try_mark_subtask_complete(task_id, subtask_id))
    }

    fn try_mark_subtask_complete(&self, task_id: &str, subtask_id: &str) -> Result<ToolResponse> {
        let _task = self.resolve_task(task_id)?;
        let _lock = self.store().lock_task(task_id)?;
        let mut state = self.store().load_or_init_state(task_id)?;

        let workflow = state.active_mut().ok_or_else(|| {
            Error::InvalidState(format!("no workflow is active for task '{task_id}'"))
        })?;
        if workflow.tool_name != "implement_task" {
            return Err(Error::InvalidState(format!(
                "mark_subtask_complete is only valid inside implement_task; \
                 task '{task_id}' is running '{}'",
                workflow.tool_name
            )));
        }

        let planned: Vec<String> = workflow
            .context(context_keys::ARTIFACT_CONTENT)
            .and_then(|plan| plan.get("subtasks"))
            .and_then(Value::as_array)
            .map(|subtasks| {
                subtasks
                    .iter()
                    .filter_map(|s| s.get("subtask_id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if !planned.iter().any(|id| id == subtask_id) {
            return Err(Error::InvalidState(format!(
                "unknown subtask '{subtask_id}'; the plan defines: {}",
                planned.join(", ")
            )));
        }

        let mut completed = workflow.context_str_list(context_keys::COMPLETED_SUBTASKS);
        if !completed.iter().any(|id| id == subtask_id) {
            completed.push(subtask_id.to_string());
            completed.sort();
        }
        workflow.set_context(context_keys::COMPLETED_SUBTASKS, json!(completed));
        state.touch();
        self.store().save_state(&state)?;

        let remaining: Vec<&String> = planned.iter().filter(|id| !completed.contains(id)).collect();
        let percent = (completed.len() as f64 / planned.len() as f64 * 100.0).round() as u32;
        Ok(ToolResponse::success(format!(
            "Subtask '{subtask_id}' complete: {}/{} done ({percent}%), {} remaining.",
            completed.len(),
            planned.len(),
            remaining.len()
        ))
        .with_data(json!({
            "completed_subtasks": completed,
            "remaining": remaining,
            "percent": percent,
        })))
    }

    fn autonomous_mode(&self, workflow: &WorkflowState) -> bool {
        self.config().autonomous_mode
            || workflow
                .context(context_keys::AUTONOMOUS_MODE)
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }
}
