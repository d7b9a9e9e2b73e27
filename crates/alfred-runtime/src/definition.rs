use crate::runtime::Runtime;
use crate::Result;
use alfred_engine::StateMachine;
use alfred_store::TaskStore;
use alfred_types::{Task, TaskState, TaskStatus, ToolResponse};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Cross-tool artifact dependency.
///
/// The named state's latest artifact (from the turn log) is loaded
/// into the dependent tool's context store under `artifact_content`
/// before any of its states run. One mechanism for every handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHandoff {
    pub tool: &'static str,
    pub state: &'static str,
}

/// Everything a custom context loader can see.
pub struct LoaderContext<'a> {
    pub task: &'a Task,
    pub task_state: &'a TaskState,
    pub store: &'a TaskStore,
}

/// Optional per-tool context loader, invoked on every handler call.
/// Its returned map is merged into the workflow's context store.
pub type ContextLoader = fn(&LoaderContext<'_>) -> Result<Map<String, Value>>;

/// Implementation of a simple (stateless) tool.
pub type SimpleLogic = fn(&Runtime, &Value) -> Result<ToolResponse>;

/// A multi-state workflow tool: the declarative description the
/// state-machine builder and the generic handler both run on.
pub struct WorkflowDef {
    pub name: &'static str,
    pub description: &'static str,
    /// Ordered work states; each is expanded into a review cycle.
    pub work_states: Vec<String>,
    /// Optional state placed before the first work state, exited by
    /// the `dispatch` trigger.
    pub dispatch_state: Option<String>,
    pub terminal_state: String,
    pub initial_state: String,
    /// Statuses this tool is willing to start a workflow from.
    pub entry_statuses: Vec<TaskStatus>,
    /// Status assigned when this tool's workflow reaches its terminal state.
    pub exit_status: TaskStatus,
    /// Status assigned when a workflow is first created, marking the
    /// phase as underway (e.g. `planning`, `in_development`).
    pub active_status: Option<TaskStatus>,
    /// Hard gate: when set, the handler refuses any other status.
    pub required_status: Option<TaskStatus>,
    pub dispatch_on_init: bool,
    pub produces_artifacts: bool,
    pub requires_artifact_from: Option<ArtifactHandoff>,
    pub context_loader: Option<ContextLoader>,
    /// Work state -> JSON Schema for the artifact submitted there.
    /// A missing entry accepts any JSON object.
    pub artifact_map: BTreeMap<String, Value>,
}

impl WorkflowDef {
    /// Build the runtime state machine for this definition.
    pub fn machine(&self) -> alfred_engine::Result<StateMachine> {
        StateMachine::build(
            &self.work_states,
            self.dispatch_state.as_deref(),
            &self.terminal_state,
        )
    }

    /// The last work state; its artifact becomes the tool's completed
    /// output when the workflow finishes.
    pub fn final_work_state(&self) -> &str {
        self.work_states
            .last()
            .map(String::as_str)
            .unwrap_or(&self.terminal_state)
    }

    pub fn is_work_state(&self, state: &str) -> bool {
        self.work_states.iter().any(|w| w == state)
    }
}

/// A tool with no state machine: one function, one response.
pub struct SimpleDef {
    pub name: &'static str,
    pub description: &'static str,
    pub logic: SimpleLogic,
}

/// The two shapes a tool can take. Modeled as a sum type so a simple
/// tool cannot half-declare a state machine and a workflow tool cannot
/// ship without one.
pub enum ToolDefinition {
    Workflow(WorkflowDef),
    Simple(SimpleDef),
}

impl ToolDefinition {
    pub fn name(&self) -> &'static str {
        match self {
            ToolDefinition::Workflow(def) => def.name,
            ToolDefinition::Simple(def) => def.name,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolDefinition::Workflow(def) => def.description,
            ToolDefinition::Simple(def) => def.description,
        }
    }

    /// Entry statuses for routing; simple tools own no status.
    pub fn entry_statuses(&self) -> &[TaskStatus] {
        match self {
            ToolDefinition::Workflow(def) => &def.entry_statuses,
            ToolDefinition::Simple(_) => &[],
        }
    }

    pub fn as_workflow(&self) -> Option<&WorkflowDef> {
        match self {
            ToolDefinition::Workflow(def) => Some(def),
            ToolDefinition::Simple(_) => None,
        }
    }
}
