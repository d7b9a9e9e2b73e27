use crate::store::{SCRATCHPAD_FILE, TaskStore, write_atomic};
use crate::Result;
use alfred_types::Turn;
use serde_json::Value;
use std::fmt::Write as _;

/// Header fields for the scratchpad view; the store itself does not
/// know task titles or statuses, so the caller supplies them.
#[derive(Debug, Clone)]
pub struct ScratchpadHeader {
    pub task_id: String,
    pub title: String,
    pub task_status: String,
    pub current_state: String,
}

const REVISION_HISTORY_LIMIT: usize = 5;

impl TaskStore {
    /// Regenerate the human-readable scratchpad from the turn log.
    ///
    /// The scratchpad is disposable: it can always be rebuilt from the
    /// log, which stays authoritative. Called after every submit.
    pub fn regenerate_scratchpad(&self, header: &ScratchpadHeader) -> Result<()> {
        let turns = self.load_turns(&header.task_id)?;
        let content = render_scratchpad(header, &turns);
        let path = self.ensure_task_dir(&header.task_id)?.join(SCRATCHPAD_FILE);
        write_atomic(&path, content.as_bytes())
    }
}

fn render_scratchpad(header: &ScratchpadHeader, turns: &[Turn]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} — {}", header.task_id, header.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Status:** {}", header.task_status);
    let _ = writeln!(out, "- **State:** {}", header.current_state);
    let _ = writeln!(out, "- **Turns:** {}", turns.len());

    // Latest artifact per state, in first-submission order.
    let mut order: Vec<&str> = Vec::new();
    for turn in turns {
        if !turn.is_meta() && !order.contains(&turn.state_name.as_str()) {
            order.push(&turn.state_name);
        }
    }

    for state in order {
        let latest = turns
            .iter()
            .rev()
            .find(|t| t.state_name == state)
            .expect("state came from this turn list");
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", heading(state));
        let _ = writeln!(out);
        let _ = writeln!(out, "_Turn {} at {}_", latest.turn_number, latest.timestamp);
        let _ = writeln!(out);
        render_artifact(&mut out, &latest.artifact_data);
    }

    let revisions: Vec<&Turn> = turns.iter().filter(|t| t.is_meta()).collect();
    if !revisions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Revision History");
        let _ = writeln!(out);
        for turn in revisions.iter().rev().take(REVISION_HISTORY_LIMIT) {
            let state = turn.artifact_data["state_to_revise"].as_str().unwrap_or("?");
            let feedback = turn.artifact_data["feedback"].as_str().unwrap_or("");
            let _ = writeln!(out, "- Turn {} ({}): {} — {}", turn.turn_number, turn.timestamp, state, feedback);
        }
    }

    out
}

fn render_artifact(out: &mut String, artifact: &Value) {
    match artifact {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(items) => {
                        let _ = writeln!(out, "**{}:**", heading(key));
                        for item in items {
                            let _ = writeln!(out, "- {}", inline(item));
                        }
                    }
                    other => {
                        let _ = writeln!(out, "**{}:** {}", heading(key), inline(other));
                    }
                }
                let _ = writeln!(out);
            }
        }
        other => {
            let _ = writeln!(out, "{}", inline(other));
        }
    }
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `implementation_plan` -> `Implementation Plan`
fn heading(raw: &str) -> String {
    raw.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewTurn;
    use alfred_types::REVISION_REQUEST_STATE;
    use serde_json::json;
    use tempfile::tempdir;

    fn header() -> ScratchpadHeader {
        ScratchpadHeader {
            task_id: "AL-01".to_string(),
            title: "Add cache invalidation".to_string(),
            task_status: "planning".to_string(),
            current_state: "discovery".to_string(),
        }
    }

    #[test]
    fn scratchpad_renders_latest_artifact_per_phase() {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path());
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"findings": "old"})))
            .unwrap();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"findings": "new"})))
            .unwrap();

        store.regenerate_scratchpad(&header()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("AL-01").join("scratchpad.md")).unwrap();

        assert!(content.contains("# AL-01 — Add cache invalidation"));
        assert!(content.contains("## Discovery"));
        assert!(content.contains("new"));
        assert!(!content.contains("old"));
    }

    #[test]
    fn scratchpad_lists_revision_history() {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path());
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"findings": "x"})))
            .unwrap();
        store
            .append_turn(
                "AL-01",
                NewTurn::new(
                    REVISION_REQUEST_STATE,
                    "plan_task",
                    json!({"state_to_revise": "discovery", "feedback": "go deeper"}),
                ),
            )
            .unwrap();

        store.regenerate_scratchpad(&header()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("AL-01").join("scratchpad.md")).unwrap();

        assert!(content.contains("## Revision History"));
        assert!(content.contains("go deeper"));
    }

    #[test]
    fn regeneration_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path());
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"findings": "x"})))
            .unwrap();

        store.regenerate_scratchpad(&header()).unwrap();
        let first = std::fs::read_to_string(dir.path().join("AL-01").join("scratchpad.md")).unwrap();
        store.regenerate_scratchpad(&header()).unwrap();
        let second = std::fs::read_to_string(dir.path().join("AL-01").join("scratchpad.md")).unwrap();
        assert_eq!(first, second);
    }
}
