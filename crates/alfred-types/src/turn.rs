use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// State name used by revision-request meta turns. Meta turns are
/// excluded from the latest-artifact view of the log.
pub const REVISION_REQUEST_STATE: &str = "revision_request";

/// One immutable entry in a task's event log.
///
/// A turn is written on every successful submission and on every
/// revision request; it is never modified afterwards. Turn numbers are
/// dense positive integers starting at 1 -- a gap indicates data loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_number: u32,
    pub state_name: String,
    pub tool_name: String,
    pub timestamp: String,
    pub artifact_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_of: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_feedback: Option<String>,
}

impl Turn {
    /// Meta turns record workflow events (revision requests) rather
    /// than submitted artifacts.
    pub fn is_meta(&self) -> bool {
        self.state_name == REVISION_REQUEST_STATE
    }
}

/// Index record kept next to the turn log for O(1) lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskManifest {
    pub task_id: String,
    pub created_at: String,
    pub last_updated: String,
    pub current_state: String,
    pub total_turns: u32,
    #[serde(default)]
    pub latest_turns_by_state: BTreeMap<String, u32>,
}

impl TaskManifest {
    pub fn new(task_id: impl Into<String>) -> Self {
        let now = crate::now_rfc3339();
        Self {
            task_id: task_id.into(),
            created_at: now.clone(),
            last_updated: now,
            current_state: String::new(),
            total_turns: 0,
            latest_turns_by_state: BTreeMap::new(),
        }
    }

    /// Record a freshly appended turn. Meta turns bump the total but do
    /// not participate in the latest-by-state view.
    pub fn record_turn(&mut self, turn: &Turn) {
        self.total_turns = self.total_turns.max(turn.turn_number);
        if !turn.is_meta() {
            self.latest_turns_by_state
                .insert(turn.state_name.clone(), turn.turn_number);
        }
        self.last_updated = crate::now_rfc3339();
    }
}
