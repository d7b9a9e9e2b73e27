use crate::store::{TaskStore, write_json_atomic};
use crate::{Error, Result};
use alfred_types::{TaskManifest, Turn, now_rfc3339};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;

/// A turn about to be appended. Numbering and timestamps are the
/// store's job, not the caller's.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub state_name: String,
    pub tool_name: String,
    pub artifact_data: Value,
    pub revision_of: Option<u32>,
    pub revision_feedback: Option<String>,
}

impl NewTurn {
    pub fn new(state_name: impl Into<String>, tool_name: impl Into<String>, artifact_data: Value) -> Self {
        Self {
            state_name: state_name.into(),
            tool_name: tool_name.into(),
            artifact_data,
            revision_of: None,
            revision_feedback: None,
        }
    }

    pub fn with_revision(mut self, revision_of: Option<u32>, feedback: Option<String>) -> Self {
        self.revision_of = revision_of;
        self.revision_feedback = feedback;
        self
    }
}

impl TaskStore {
    /// Append one turn to the task's log and index it in the manifest.
    ///
    /// The turn number is derived from a directory scan, never from
    /// timestamps: `count(existing turns) + 1` keeps the sequence dense
    /// even if the process clock jumps.
    pub fn append_turn(&self, task_id: &str, new_turn: NewTurn) -> Result<Turn> {
        let turns_dir = self.turns_dir(task_id)?;
        fs::create_dir_all(&turns_dir)?;

        let turn_number = count_turn_files(&turns_dir)? + 1;
        let turn = Turn {
            turn_number,
            state_name: new_turn.state_name,
            tool_name: new_turn.tool_name,
            timestamp: now_rfc3339(),
            artifact_data: new_turn.artifact_data,
            revision_of: new_turn.revision_of,
            revision_feedback: new_turn.revision_feedback,
        };

        let file_stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let file_name = format!("{:03}-{}-{}.json", turn.turn_number, turn.state_name, file_stamp);
        write_json_atomic(&turns_dir.join(file_name), &turn)?;

        let mut manifest = self
            .load_manifest(task_id)?
            .unwrap_or_else(|| TaskManifest::new(task_id));
        manifest.record_turn(&turn);
        self.save_manifest(&manifest)?;

        Ok(turn)
    }

    /// All turns in turn-number order (equal to file-name order).
    pub fn load_turns(&self, task_id: &str) -> Result<Vec<Turn>> {
        let turns_dir = self.turns_dir(task_id)?;
        let entries = match fs::read_dir(&turns_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(Error::Io(err)),
        };

        let mut turns = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            let turn: Turn = serde_json::from_str(&contents).map_err(|source| Error::Corrupt {
                path: path.display().to_string(),
                source,
            })?;
            turns.push(turn);
        }

        turns.sort_by_key(|t| t.turn_number);
        Ok(turns)
    }

    /// Latest artifact per state across the whole log, skipping meta
    /// turns. Folding in turn order makes "latest" well-defined.
    pub fn latest_artifacts_by_state(&self, task_id: &str) -> Result<BTreeMap<String, Value>> {
        let mut latest = BTreeMap::new();
        for turn in self.load_turns(task_id)? {
            if turn.is_meta() {
                continue;
            }
            latest.insert(turn.state_name, turn.artifact_data);
        }
        Ok(latest)
    }
}

fn count_turn_files(turns_dir: &std::path::Path) -> Result<u32> {
    let mut count = 0;
    for entry in fs::read_dir(turns_dir)? {
        let entry = entry?;
        if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfred_types::REVISION_REQUEST_STATE;
    use serde_json::json;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, TaskStore) {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn turn_numbers_are_dense_from_one() {
        let (_dir, store) = store();
        for i in 1..=4 {
            let turn = store
                .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"i": i})))
                .unwrap();
            assert_eq!(turn.turn_number, i);
        }

        let numbers: Vec<u32> = store
            .load_turns("AL-01")
            .unwrap()
            .iter()
            .map(|t| t.turn_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn manifest_indexes_every_append() {
        let (_dir, store) = store();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"a": 1})))
            .unwrap();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"a": 2})))
            .unwrap();

        let manifest = store.load_manifest("AL-01").unwrap().unwrap();
        assert_eq!(manifest.total_turns, 2);
        assert_eq!(manifest.latest_turns_by_state["discovery"], 2);
    }

    #[test]
    fn latest_artifacts_take_the_last_submission_per_state() {
        let (_dir, store) = store();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"v": "old"})))
            .unwrap();
        store
            .append_turn("AL-01", NewTurn::new("clarification", "plan_task", json!({"v": "c"})))
            .unwrap();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"v": "new"})))
            .unwrap();

        let latest = store.latest_artifacts_by_state("AL-01").unwrap();
        assert_eq!(latest["discovery"]["v"], "new");
        assert_eq!(latest["clarification"]["v"], "c");
    }

    #[test]
    fn meta_turns_are_numbered_but_not_in_the_artifact_view() {
        let (_dir, store) = store();
        store
            .append_turn("AL-01", NewTurn::new("discovery", "plan_task", json!({"v": 1})))
            .unwrap();
        let meta = store
            .append_turn(
                "AL-01",
                NewTurn::new(REVISION_REQUEST_STATE, "plan_task", json!({"feedback": "more"})),
            )
            .unwrap();

        assert_eq!(meta.turn_number, 2);
        let latest = store.latest_artifacts_by_state("AL-01").unwrap();
        assert!(!latest.contains_key(REVISION_REQUEST_STATE));

        let manifest = store.load_manifest("AL-01").unwrap().unwrap();
        assert_eq!(manifest.total_turns, 2);
        assert!(!manifest.latest_turns_by_state.contains_key(REVISION_REQUEST_STATE));
    }

    #[test]
    fn revision_links_survive_the_roundtrip() {
        let (_dir, store) = store();
        let turn = store
            .append_turn(
                "AL-01",
                NewTurn::new("discovery", "plan_task", json!({"v": 2}))
                    .with_revision(Some(1), Some("needs depth".to_string())),
            )
            .unwrap();
        assert_eq!(turn.revision_of, Some(1));

        let loaded = store.load_turns("AL-01").unwrap();
        assert_eq!(loaded[0].revision_of, Some(1));
        assert_eq!(loaded[0].revision_feedback.as_deref(), Some("needs depth"));
    }

    #[test]
    fn empty_log_reads_as_empty() {
        let (_dir, store) = store();
        assert!(store.load_turns("AL-01").unwrap().is_empty());
        assert!(store.latest_artifacts_by_state("AL-01").unwrap().is_empty());
    }
}
