use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a task.
///
/// The variants are ordered: a task normally moves top-to-bottom through
/// this list, although individual phases may send it backwards (for
/// example a review requesting revisions). `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    CreatingSpec,
    SpecCompleted,
    CreatingTasks,
    TasksCreated,
    Planning,
    ReadyForDevelopment,
    InDevelopment,
    ReadyForReview,
    InReview,
    RevisionsRequested,
    ReadyForTesting,
    InTesting,
    ReadyForFinalization,
    InFinalization,
    Done,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [TaskStatus; 16] = [
        TaskStatus::New,
        TaskStatus::CreatingSpec,
        TaskStatus::SpecCompleted,
        TaskStatus::CreatingTasks,
        TaskStatus::TasksCreated,
        TaskStatus::Planning,
        TaskStatus::ReadyForDevelopment,
        TaskStatus::InDevelopment,
        TaskStatus::ReadyForReview,
        TaskStatus::InReview,
        TaskStatus::RevisionsRequested,
        TaskStatus::ReadyForTesting,
        TaskStatus::InTesting,
        TaskStatus::ReadyForFinalization,
        TaskStatus::InFinalization,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::CreatingSpec => "creating_spec",
            TaskStatus::SpecCompleted => "spec_completed",
            TaskStatus::CreatingTasks => "creating_tasks",
            TaskStatus::TasksCreated => "tasks_created",
            TaskStatus::Planning => "planning",
            TaskStatus::ReadyForDevelopment => "ready_for_development",
            TaskStatus::InDevelopment => "in_development",
            TaskStatus::ReadyForReview => "ready_for_review",
            TaskStatus::InReview => "in_review",
            TaskStatus::RevisionsRequested => "revisions_requested",
            TaskStatus::ReadyForTesting => "ready_for_testing",
            TaskStatus::InTesting => "in_testing",
            TaskStatus::ReadyForFinalization => "ready_for_finalization",
            TaskStatus::InFinalization => "in_finalization",
            TaskStatus::Done => "done",
        }
    }

    /// True for the terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// True while an execution phase is actively working the task.
    ///
    /// Used by the next-task ranking: in-flight execution outranks
    /// everything else.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            TaskStatus::InDevelopment
                | TaskStatus::InReview
                | TaskStatus::RevisionsRequested
                | TaskStatus::InTesting
                | TaskStatus::InFinalization
        )
    }

    /// True once the pipeline has picked the task up: a phase finished
    /// or preparation (spec, planning) is underway. Ranks above tasks
    /// nothing has touched yet.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            TaskStatus::CreatingSpec
                | TaskStatus::SpecCompleted
                | TaskStatus::CreatingTasks
                | TaskStatus::TasksCreated
                | TaskStatus::Planning
                | TaskStatus::ReadyForDevelopment
                | TaskStatus::ReadyForReview
                | TaskStatus::ReadyForTesting
                | TaskStatus::ReadyForFinalization
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown task status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::ReadyForDevelopment).unwrap();
        assert_eq!(json, "\"ready_for_development\"");
        let back: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskStatus::ReadyForDevelopment);
    }

    #[test]
    fn from_str_roundtrips_every_variant() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert!("not_a_status".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn only_done_is_terminal() {
        for status in TaskStatus::ALL {
            assert_eq!(status.is_terminal(), status == TaskStatus::Done);
        }
    }

    #[test]
    fn in_progress_and_ready_are_disjoint() {
        for status in TaskStatus::ALL {
            assert!(!(status.is_in_progress() && status.is_ready()), "{status}");
        }
    }
}
