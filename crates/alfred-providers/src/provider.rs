use crate::Result;
use alfred_types::{Task, TaskStatus, ToolResponse};

/// Source of task definitions.
///
/// The engine core calls exactly these four methods; everything else
/// about a tracker (authentication, pagination, caching) is the
/// provider's business. Status updates flow both ways: the state store
/// stays authoritative, `update_task_status` mirrors changes out to
/// the tracker.
pub trait TaskProvider: Send + Sync {
    /// Fetch one task by id, or `None` when the tracker does not know it.
    fn get_task(&self, task_id: &str) -> Result<Option<Task>>;

    /// Every task the tracker knows about, in no particular order.
    fn get_all_tasks(&self) -> Result<Vec<Task>>;

    /// Ranked recommendation of what to work on next.
    fn get_next_task(&self) -> Result<ToolResponse>;

    /// Mirror a status change to the tracker. Returns false when the
    /// tracker rejected or ignored the update.
    fn update_task_status(&self, task_id: &str, new_status: TaskStatus) -> Result<bool>;
}
