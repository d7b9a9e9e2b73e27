use crate::TaskStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority, parsed from the optional `## Priority` section of a
/// task file. Defaults to `Medium` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A unit of work driven through the phase pipeline.
///
/// Tasks are immutable within a workflow step: the engine reads them from
/// a provider and never writes them back except to cache the definition
/// locally. The authoritative status lives in the state store, not here;
/// `task_status` is the store's view at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    pub context: String,
    pub implementation_details: String,
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub ac_verification_steps: Vec<String>,
    #[serde(default)]
    pub dev_notes: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub task_status: TaskStatus,
}

impl Task {
    /// Trailing numeric suffix of the task id, used for deterministic
    /// ranking (`AL-12` -> 12). Ids without a numeric suffix rank last.
    pub fn numeric_suffix(&self) -> u64 {
        let digits: String = self
            .task_id
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits
            .chars()
            .rev()
            .collect::<String>()
            .parse()
            .unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            task_id: id.to_string(),
            title: "t".to_string(),
            context: String::new(),
            implementation_details: String::new(),
            acceptance_criteria: vec![],
            ac_verification_steps: vec![],
            dev_notes: None,
            priority: TaskPriority::default(),
            dependencies: vec![],
            task_status: TaskStatus::New,
        }
    }

    #[test]
    fn numeric_suffix_parses_trailing_digits() {
        assert_eq!(task("AL-01").numeric_suffix(), 1);
        assert_eq!(task("AL-120").numeric_suffix(), 120);
    }

    #[test]
    fn numeric_suffix_without_digits_ranks_last() {
        assert_eq!(task("epic").numeric_suffix(), u64::MAX);
    }

    #[test]
    fn priority_defaults_to_medium() {
        let json = r#"{
            "task_id": "AL-01",
            "title": "t",
            "context": "",
            "implementation_details": "",
            "acceptance_criteria": [],
            "task_status": "new"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, TaskPriority::Medium);
    }
}
