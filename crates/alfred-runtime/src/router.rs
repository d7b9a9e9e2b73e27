//! Status routing: which tool owns a task in a given status.
//!
//! Pure lookups over the registry's entry/exit declarations. The first
//! tool accepting a status wins, so the builtin table is curated to
//! keep the mapping unambiguous.

use crate::definition::WorkflowDef;
use crate::registry::Registry;
use alfred_types::TaskStatus;

impl Registry {
    /// The workflow tool owning `status`, or `None` for `done` (and
    /// any status no tool claims).
    pub fn tool_for_status(&self, status: TaskStatus) -> Option<&WorkflowDef> {
        self.all_tools()
            .filter_map(|tool| tool.as_workflow())
            .find(|def| def.entry_statuses.contains(&status))
    }

    /// The status a task will hold after the owning tool's workflow
    /// completes.
    pub fn next_status(&self, status: TaskStatus) -> Option<TaskStatus> {
        self.tool_for_status(status).map(|def| def.exit_status)
    }

    pub fn is_terminal_status(&self, status: TaskStatus) -> bool {
        status.is_terminal()
    }
}
