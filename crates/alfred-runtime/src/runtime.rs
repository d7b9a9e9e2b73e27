use crate::context::{Overlays, build_context};
use crate::definition::{LoaderContext, ToolDefinition, WorkflowDef};
use crate::registry::Registry;
use crate::templates::{HandlebarsRenderer, PromptRenderer, prompt_key};
use crate::{Config, Error, Result};
use alfred_providers::{LocalProvider, TaskProvider};
use alfred_store::TaskStore;
use alfred_types::{Task, ToolResponse, WorkflowState, context_keys};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One fully wired engine instance.
///
/// Holds the read-only registry and configuration plus the store,
/// provider and renderer collaborators. Handlers borrow it immutably;
/// all mutable state lives on disk behind the per-task lock.
pub struct Runtime {
    config: Config,
    workspace_root: PathBuf,
    registry: Registry,
    store: TaskStore,
    provider: Box<dyn TaskProvider>,
    renderer: Box<dyn PromptRenderer>,
}

impl Runtime {
    /// Wire a runtime from explicit parts (tests swap in their own
    /// provider or renderer here).
    pub fn new(
        config: Config,
        workspace_root: impl Into<PathBuf>,
        registry: Registry,
        store: TaskStore,
        provider: Box<dyn TaskProvider>,
        renderer: Box<dyn PromptRenderer>,
    ) -> Self {
        Self {
            config,
            workspace_root: workspace_root.into(),
            registry,
            store,
            provider,
            renderer,
        }
    }

    /// Open the workspace at `root` with the builtin tool table, the
    /// local provider and the handlebars renderer (defaults plus any
    /// overrides in `{root}/templates`).
    pub fn open(root: &Path) -> Result<Self> {
        let workspace_root = root.to_path_buf();
        let config = Config::load(&workspace_root)?;
        let registry = Registry::builtin()?;
        let store = TaskStore::new(&workspace_root);
        let provider = LocalProvider::new(config.tasks_root(&workspace_root), store.clone());

        let mut renderer = HandlebarsRenderer::with_defaults(&registry)?;
        let overrides = renderer.load_overrides(&workspace_root.join("templates"))?;
        debug!(overrides, "prompt templates loaded");

        Ok(Self::new(
            config,
            workspace_root,
            registry,
            store,
            Box::new(provider),
            Box::new(renderer),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn provider(&self) -> &dyn TaskProvider {
        self.provider.as_ref()
    }

    pub fn tasks_root(&self) -> PathBuf {
        self.config.tasks_root(&self.workspace_root)
    }

    /// Invoke a registered tool by name. This is the single entry
    /// point used by the MCP surface for everything that is not a
    /// transition driver.
    pub fn invoke_tool(&self, tool_name: &str, args: &Value) -> ToolResponse {
        self.respond(self.try_invoke_tool(tool_name, args))
    }

    fn try_invoke_tool(&self, tool_name: &str, args: &Value) -> Result<ToolResponse> {
        let definition = self.registry.get(tool_name).ok_or_else(|| {
            Error::NotFound(format!(
                "unknown tool '{tool_name}'; available: {}",
                self.registry
                    .all_tools()
                    .map(|t| t.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        match definition {
            ToolDefinition::Simple(def) => {
                debug!(tool = def.name, "running simple tool");
                (def.logic)(self, args)
            }
            ToolDefinition::Workflow(def) => {
                let task_id = required_str_arg(args, "task_id")?;
                self.enter_workflow(def, task_id)
            }
        }
    }

    /// The generic handler: the one code path behind every workflow
    /// tool. Tools differ only in their declarative definition.
    fn enter_workflow(&self, def: &WorkflowDef, task_id: &str) -> Result<ToolResponse> {
        let task = self.resolve_task(task_id)?;
        let _lock = self.store.lock_task(task_id)?;
        let mut state = self.store.load_or_init_state(task_id)?;

        if let Some(required) = def.required_status
            && state.task_status != required
        {
            return Err(Error::InvalidState(format!(
                "'{}' requires status '{}' but task {} is '{}'",
                def.name, required, task_id, state.task_status
            )));
        }

        let machine = def.machine()?;
        let fresh = !matches!(state.active(), Some(ws) if ws.tool_name == def.name);

        if fresh {
            if !def.entry_statuses.contains(&state.task_status) {
                return Err(Error::InvalidState(format!(
                    "'{}' cannot start from status '{}'; accepted statuses: {}",
                    def.name,
                    state.task_status,
                    def.entry_statuses
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }

            state.active_tool_state = Some(WorkflowState::new(
                task_id,
                def.name,
                def.initial_state.clone(),
            ));
            if let Some(active_status) = def.active_status
                && state.task_status != active_status
            {
                state.task_status = active_status;
                self.provider.update_task_status(task_id, active_status)?;
            }
            info!(tool = def.name, task_id, "workflow started");
        }

        // Cross-tool handoff: the dependency's latest artifact becomes
        // this workflow's artifact_content. Turn-log-backed so a
        // restarted phase sees the same payload as a fresh one.
        let handoff_payload = match def.requires_artifact_from {
            Some(handoff) => {
                let latest = self.store.latest_artifacts_by_state(task_id)?;
                let payload = latest.get(handoff.state).cloned().ok_or_else(|| {
                    Error::InvalidState(format!(
                        "'{}' requires the '{}' artifact produced by '{}'; run '{}' to completion first",
                        def.name, handoff.state, handoff.tool, handoff.tool
                    ))
                })?;
                Some(payload)
            }
            None => None,
        };

        let loaded_context = match def.context_loader {
            Some(loader) => {
                let loader_ctx = LoaderContext {
                    task: &task,
                    task_state: &state,
                    store: &self.store,
                };
                Some(loader(&loader_ctx)?)
            }
            None => None,
        };

        let workflow = state
            .active_mut()
            .expect("workflow state was just ensured");
        if let Some(payload) = handoff_payload {
            workflow.set_context(context_keys::ARTIFACT_CONTENT, payload);
        }
        if let Some(entries) = loaded_context {
            for (key, value) in entries {
                workflow.set_context(key, value);
            }
        }

        if def.dispatch_on_init
            && let Some(dispatch) = def.dispatch_state.as_deref()
            && workflow.current_state == dispatch
        {
            let next = machine.fire(dispatch, alfred_engine::TRIGGER_DISPATCH)?;
            debug!(tool = def.name, task_id, from = dispatch, to = %next, "dispatched");
            workflow.current_state = next;
        }

        let current_state = workflow.current_state.clone();
        state.touch();
        self.store.save_state(&state)?;
        self.store.update_manifest_state(task_id, &current_state)?;

        let prompt = self.render_prompt(&task, &state, Overlays::default())?;
        Ok(ToolResponse::success(format!(
            "Task {task_id} is in '{current_state}' of {}.",
            def.name
        ))
        .with_data(json!({"tool_name": def.name, "current_state": current_state}))
        .with_prompt(prompt))
    }

    /// Load the task, with remediation guidance when it is unknown.
    pub(crate) fn resolve_task(&self, task_id: &str) -> Result<Task> {
        self.provider.get_task(task_id)?.ok_or_else(|| {
            Error::NotFound(format!(
                "task '{task_id}' not found; expected a task file at {} \
                 (first line '# TASK: {task_id}'). Create it with create_task.",
                self.tasks_root().join(format!("{task_id}.md")).display()
            ))
        })
    }

    /// Render the prompt for the task's current workflow state.
    pub(crate) fn render_prompt(
        &self,
        task: &Task,
        state: &alfred_types::TaskState,
        overlays: Overlays,
    ) -> Result<String> {
        let workflow = state.active().ok_or_else(|| {
            Error::InvalidState(format!("no active workflow for task '{}'", task.task_id))
        })?;
        self.render_prompt_for(task, state, workflow, overlays)
    }

    /// Render for an explicit workflow value; used on the terminal
    /// path where `active_tool_state` has already been cleared.
    pub(crate) fn render_prompt_for(
        &self,
        task: &Task,
        state: &alfred_types::TaskState,
        workflow: &WorkflowState,
        overlays: Overlays,
    ) -> Result<String> {
        let latest = self.store.latest_artifacts_by_state(&task.task_id)?;
        let mut task = task.clone();
        task.task_status = state.task_status;
        let context = build_context(&task, workflow, &latest, overlays);
        let key = prompt_key(&workflow.tool_name, &workflow.current_state);
        self.renderer.render(&key, &context)
    }

    /// Convert expected failures into error responses; nothing
    /// crosses the tool boundary as a panic.
    pub(crate) fn respond(&self, result: Result<ToolResponse>) -> ToolResponse {
        match result {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "tool invocation failed");
                ToolResponse::error(err.to_string())
            }
        }
    }
}

/// Extract a required string argument from a tool's JSON arguments.
pub(crate) fn required_str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidState(format!("missing required argument '{name}'")))
}
