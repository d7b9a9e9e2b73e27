use crate::definition::{ArtifactHandoff, SimpleDef, ToolDefinition, WorkflowDef};
use crate::{Error, Result, simple};
use alfred_engine::schemas;
use alfred_types::TaskStatus;
use std::collections::BTreeMap;

/// The declarative tool table.
///
/// Built once at startup, validated, and read-only afterwards. Order
/// matters: status routing scans the table top to bottom and the first
/// tool accepting a status owns it.
pub struct Registry {
    tools: Vec<ToolDefinition>,
}

impl Registry {
    /// The builtin tool set.
    ///
    /// Adding a phase to the pipeline reduces to adding an entry here:
    /// the review cycles, transition plumbing and routing all derive
    /// from the declaration.
    pub fn builtin() -> Result<Self> {
        let tools = vec![
            ToolDefinition::Workflow(WorkflowDef {
                name: "plan_task",
                description: "Drive a task through discovery, clarification, contracts, planning and validation",
                work_states: strings(&[
                    "discovery",
                    "clarification",
                    "contracts",
                    "implementation_plan",
                    "validation",
                ]),
                dispatch_state: None,
                terminal_state: "verified".to_string(),
                initial_state: "discovery".to_string(),
                entry_statuses: vec![
                    TaskStatus::New,
                    TaskStatus::TasksCreated,
                    TaskStatus::Planning,
                ],
                exit_status: TaskStatus::ReadyForDevelopment,
                active_status: Some(TaskStatus::Planning),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: None,
                context_loader: None,
                artifact_map: artifact_map(&[
                    ("discovery", schemas::discovery()),
                    ("clarification", schemas::clarification()),
                    ("contracts", schemas::contracts()),
                    ("implementation_plan", schemas::implementation_plan()),
                    ("validation", schemas::validation()),
                ]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "implement_task",
                description: "Execute the implementation plan, tracking subtask completion",
                work_states: strings(&["implementing"]),
                dispatch_state: Some("dispatching".to_string()),
                terminal_state: "completed".to_string(),
                initial_state: "dispatching".to_string(),
                entry_statuses: vec![
                    TaskStatus::ReadyForDevelopment,
                    TaskStatus::InDevelopment,
                    TaskStatus::RevisionsRequested,
                ],
                exit_status: TaskStatus::ReadyForReview,
                active_status: Some(TaskStatus::InDevelopment),
                required_status: None,
                dispatch_on_init: true,
                produces_artifacts: true,
                requires_artifact_from: Some(ArtifactHandoff {
                    tool: "plan_task",
                    state: "implementation_plan",
                }),
                context_loader: None,
                artifact_map: artifact_map(&[("implementing", schemas::implementing())]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "review_task",
                description: "Review the implementation against the plan and the acceptance criteria",
                work_states: strings(&["reviewing"]),
                dispatch_state: None,
                terminal_state: "completed".to_string(),
                initial_state: "reviewing".to_string(),
                entry_statuses: vec![TaskStatus::ReadyForReview, TaskStatus::InReview],
                exit_status: TaskStatus::ReadyForTesting,
                active_status: Some(TaskStatus::InReview),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: Some(ArtifactHandoff {
                    tool: "implement_task",
                    state: "implementing",
                }),
                context_loader: None,
                artifact_map: artifact_map(&[("reviewing", schemas::reviewing())]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "test_task",
                description: "Verify every acceptance criterion and record the evidence",
                work_states: strings(&["testing"]),
                dispatch_state: None,
                terminal_state: "completed".to_string(),
                initial_state: "testing".to_string(),
                entry_statuses: vec![TaskStatus::ReadyForTesting, TaskStatus::InTesting],
                exit_status: TaskStatus::ReadyForFinalization,
                active_status: Some(TaskStatus::InTesting),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: Some(ArtifactHandoff {
                    tool: "implement_task",
                    state: "implementing",
                }),
                context_loader: None,
                artifact_map: artifact_map(&[("testing", schemas::testing())]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "finalize_task",
                description: "Clean up, document and close the task out",
                work_states: strings(&["finalizing"]),
                dispatch_state: None,
                terminal_state: "completed".to_string(),
                initial_state: "finalizing".to_string(),
                entry_statuses: vec![
                    TaskStatus::ReadyForFinalization,
                    TaskStatus::InFinalization,
                ],
                exit_status: TaskStatus::Done,
                active_status: Some(TaskStatus::InFinalization),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: Some(ArtifactHandoff {
                    tool: "test_task",
                    state: "testing",
                }),
                context_loader: None,
                artifact_map: artifact_map(&[("finalizing", schemas::finalizing())]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "create_spec",
                description: "Author a specification from raw product requirements",
                work_states: strings(&["drafting"]),
                dispatch_state: None,
                terminal_state: "drafted".to_string(),
                initial_state: "drafting".to_string(),
                entry_statuses: vec![TaskStatus::New, TaskStatus::CreatingSpec],
                exit_status: TaskStatus::SpecCompleted,
                active_status: Some(TaskStatus::CreatingSpec),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: None,
                context_loader: None,
                artifact_map: artifact_map(&[("drafting", schemas::drafting())]),
            }),
            ToolDefinition::Workflow(WorkflowDef {
                name: "create_tasks_from_spec",
                description: "Break a completed specification into ordered tasks",
                work_states: strings(&["task_breakdown"]),
                dispatch_state: None,
                terminal_state: "decomposed".to_string(),
                initial_state: "task_breakdown".to_string(),
                entry_statuses: vec![TaskStatus::SpecCompleted, TaskStatus::CreatingTasks],
                exit_status: TaskStatus::TasksCreated,
                active_status: Some(TaskStatus::CreatingTasks),
                required_status: None,
                dispatch_on_init: false,
                produces_artifacts: true,
                requires_artifact_from: Some(ArtifactHandoff {
                    tool: "create_spec",
                    state: "drafting",
                }),
                context_loader: None,
                artifact_map: artifact_map(&[("task_breakdown", schemas::task_breakdown())]),
            }),
            ToolDefinition::Simple(SimpleDef {
                name: "work_on_task",
                description: "Route to the tool owning the task's current status",
                logic: simple::work_on_task,
            }),
            ToolDefinition::Simple(SimpleDef {
                name: "get_next_task",
                description: "Ranked recommendation of what to work on next",
                logic: simple::get_next_task,
            }),
            ToolDefinition::Simple(SimpleDef {
                name: "create_task",
                description: "Create a task definition file from markdown content",
                logic: simple::create_task,
            }),
        ];

        let registry = Self { tools };
        registry.validate()?;
        Ok(registry)
    }

    /// Shape invariants, enforced once at startup so handlers can
    /// assume a well-formed table.
    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(Error::Registry(format!("duplicate tool name '{}'", tool.name())));
            }

            let Some(def) = tool.as_workflow() else {
                continue;
            };
            let fail = |msg: String| Err(Error::Registry(format!("{}: {msg}", def.name)));

            if def.work_states.is_empty() {
                return fail("workflow tools need at least one work state".into());
            }
            if def.entry_statuses.is_empty() {
                return fail("workflow tools need a non-empty entry status set".into());
            }
            if def.work_states.contains(&def.terminal_state) {
                return fail("the terminal state cannot also be a work state".into());
            }
            if def.dispatch_on_init {
                if def.dispatch_state.is_none() {
                    return fail("dispatch_on_init requires a dispatch state".into());
                }
                if Some(&def.initial_state) != def.dispatch_state.as_ref() {
                    return fail("dispatch_on_init requires the initial state to be the dispatch state".into());
                }
            } else {
                let first = &def.work_states[0];
                let legal = def.initial_state == *first
                    || Some(&def.initial_state) == def.dispatch_state.as_ref();
                if !legal {
                    return fail(format!(
                        "initial state '{}' is neither the dispatch state nor the first work state",
                        def.initial_state
                    ));
                }
            }
            for state in def.artifact_map.keys() {
                if !def.is_work_state(state) {
                    return fail(format!("artifact schema declared for unknown work state '{state}'"));
                }
            }
            // fails fast on malformed work-state lists
            def.machine().map_err(|e| Error::Registry(e.to_string()))?;
        }
        Ok(())
    }

    pub fn get(&self, tool_name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name() == tool_name)
    }

    pub fn all_tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn artifact_map(entries: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    entries
        .iter()
        .map(|(state, schema)| (state.to_string(), schema.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_validates() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.get("plan_task").is_some());
        assert!(registry.get("work_on_task").is_some());
        assert!(registry.get("no_such_tool").is_none());
    }

    #[test]
    fn every_workflow_tool_has_an_exit_status_off_its_entry_set() {
        let registry = Registry::builtin().unwrap();
        for tool in registry.all_tools() {
            if let Some(def) = tool.as_workflow() {
                assert!(
                    !def.entry_statuses.contains(&def.exit_status),
                    "{} exits into its own entry set",
                    def.name
                );
            }
        }
    }

    #[test]
    fn artifact_maps_only_reference_declared_work_states() {
        let registry = Registry::builtin().unwrap();
        for tool in registry.all_tools() {
            if let Some(def) = tool.as_workflow() {
                for state in def.artifact_map.keys() {
                    assert!(def.is_work_state(state), "{}: {state}", def.name);
                }
            }
        }
    }

    #[test]
    fn builtin_machines_enumerate_exactly_the_declared_states() {
        let registry = Registry::builtin().unwrap();
        for tool in registry.all_tools() {
            let Some(def) = tool.as_workflow() else { continue };
            let machine = def.machine().unwrap();

            let mut expected: std::collections::BTreeSet<String> = def
                .work_states
                .iter()
                .flat_map(|w| {
                    vec![
                        w.clone(),
                        alfred_engine::ai_review_state(w),
                        alfred_engine::human_review_state(w),
                    ]
                })
                .collect();
            expected.insert(def.terminal_state.clone());
            if let Some(dispatch) = &def.dispatch_state {
                expected.insert(dispatch.clone());
            }

            let actual: std::collections::BTreeSet<String> =
                machine.states().map(str::to_string).collect();
            assert_eq!(actual, expected, "tool {}", def.name);
        }
    }
}
