use crate::parser::{parse_task_file, render_task_file};
use crate::{Error, Result, TaskProvider};
use alfred_store::TaskStore;
use alfred_types::{Task, TaskStatus, ToolResponse};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Markdown-file task provider.
///
/// Tasks live as `{tasks_root}/{task_id}.md`. The files carry the
/// definition only; the authoritative status is overlaid from the state
/// store on every read.
pub struct LocalProvider {
    tasks_root: PathBuf,
    store: TaskStore,
}

impl LocalProvider {
    pub fn new(tasks_root: impl Into<PathBuf>, store: TaskStore) -> Self {
        Self {
            tasks_root: tasks_root.into(),
            store,
        }
    }

    pub fn tasks_root(&self) -> &Path {
        &self.tasks_root
    }

    pub fn task_path(&self, task_id: &str) -> PathBuf {
        self.tasks_root.join(format!("{task_id}.md"))
    }

    /// Write a task definition file if one does not already exist.
    /// Cache-first: once a task has been observed it is never clobbered.
    pub fn cache_task(&self, task: &Task) -> Result<PathBuf> {
        let path = self.task_path(&task.task_id);
        if !path.exists() {
            fs::create_dir_all(&self.tasks_root)?;
            fs::write(&path, render_task_file(task))?;
        }
        Ok(path)
    }

    fn overlay_status(&self, mut task: Task) -> Result<Task> {
        if let Some(state) = self.store.load_state(&task.task_id)? {
            task.task_status = state.task_status;
        }
        Ok(task)
    }

    fn load_from(&self, path: &Path) -> Result<Task> {
        let content = fs::read_to_string(path)?;
        let task = parse_task_file(&path.display().to_string(), &content)?;
        self.overlay_status(task)
    }
}

impl TaskProvider for LocalProvider {
    fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let path = self.task_path(task_id);
        if !path.exists() {
            return Ok(None);
        }
        self.load_from(&path).map(Some)
    }

    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        if !self.tasks_root.exists() {
            return Ok(tasks);
        }
        for entry in WalkDir::new(&self.tasks_root)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            match self.load_from(path) {
                Ok(task) => tasks.push(task),
                // skip malformed files so one bad task cannot hide the rest
                Err(Error::Parse { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(tasks)
    }

    fn get_next_task(&self) -> Result<ToolResponse> {
        let candidates = rank_tasks(self.get_all_tasks()?);

        match candidates.first() {
            Some(task) => Ok(ToolResponse::success(format!(
                "Next up: {} ({}) — status {}",
                task.task_id, task.title, task.task_status
            ))
            .with_data(json!({
                "task_id": task.task_id,
                "title": task.title,
                "task_status": task.task_status,
                "ranked": candidates
                    .iter()
                    .map(|t| json!({"task_id": t.task_id, "task_status": t.task_status}))
                    .collect::<Vec<_>>(),
            }))),
            None => Ok(ToolResponse::success(
                "No pending tasks. Create one with create_task or author a spec with create_spec.",
            )),
        }
    }

    fn update_task_status(&self, _task_id: &str, _new_status: TaskStatus) -> Result<bool> {
        // The state store is authoritative and task files carry no
        // status section, so a local mirror has nothing to write.
        Ok(true)
    }
}

/// Rank order: tasks already in progress, then tasks ready for their
/// next phase, then everything else; within a group the lower numeric
/// suffix (older task) wins, with the full id as the final tiebreak.
pub fn rank_tasks(tasks: Vec<Task>) -> Vec<Task> {
    let mut candidates: Vec<Task> = tasks
        .into_iter()
        .filter(|t| !t.task_status.is_terminal())
        .collect();
    candidates.sort_by_key(|t| {
        (
            !t.task_status.is_in_progress(),
            !t.task_status.is_ready(),
            t.numeric_suffix(),
            t.task_id.clone(),
        )
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfred_types::TaskState;
    use tempfile::tempdir;

    fn write_task(root: &Path, id: &str, title: &str) {
        let content = format!(
            "# TASK: {id}\n\n## Title\n{title}\n\n## Context\nctx\n\n## Implementation Details\nimpl\n\n## Acceptance Criteria\n- works\n"
        );
        fs::create_dir_all(root).unwrap();
        fs::write(root.join(format!("{id}.md")), content).unwrap();
    }

    fn provider(dir: &Path) -> LocalProvider {
        let tasks_root = dir.join("tasks");
        let store = TaskStore::new(dir.join(".alfred"));
        LocalProvider::new(tasks_root, store)
    }

    fn set_status(dir: &Path, task_id: &str, status: TaskStatus) {
        let store = TaskStore::new(dir.join(".alfred"));
        let mut state = TaskState::new(task_id);
        state.task_status = status;
        store.save_state(&state).unwrap();
    }

    #[test]
    fn unknown_task_reads_as_none() {
        let dir = tempdir().unwrap();
        assert!(provider(dir.path()).get_task("AL-99").unwrap().is_none());
    }

    #[test]
    fn status_is_overlaid_from_the_state_store() {
        let dir = tempdir().unwrap();
        let provider = provider(dir.path());
        write_task(provider.tasks_root(), "AL-01", "first");
        set_status(dir.path(), "AL-01", TaskStatus::Planning);

        let task = provider.get_task("AL-01").unwrap().unwrap();
        assert_eq!(task.task_status, TaskStatus::Planning);
    }

    #[test]
    fn get_all_tasks_skips_malformed_files() {
        let dir = tempdir().unwrap();
        let provider = provider(dir.path());
        write_task(provider.tasks_root(), "AL-01", "good");
        fs::write(provider.tasks_root().join("broken.md"), "no header at all").unwrap();

        let tasks = provider.get_all_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id, "AL-01");
    }

    #[test]
    fn next_task_prefers_in_progress_then_ready_then_oldest() {
        let dir = tempdir().unwrap();
        let provider = provider(dir.path());
        for (id, status) in [
            ("AL-01", TaskStatus::New),
            ("AL-02", TaskStatus::Planning),
            ("AL-03", TaskStatus::ReadyForDevelopment),
            ("AL-04", TaskStatus::InReview),
            ("AL-05", TaskStatus::Done),
        ] {
            write_task(provider.tasks_root(), id, id);
            set_status(dir.path(), id, status);
        }

        let response = provider.get_next_task().unwrap();
        let data = response.data.unwrap();
        assert_eq!(data["task_id"], "AL-04");

        let order: Vec<&str> = data["ranked"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["task_id"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["AL-04", "AL-02", "AL-03", "AL-01"]);
    }

    #[test]
    fn ties_break_by_older_numeric_suffix() {
        let dir = tempdir().unwrap();
        let provider = provider(dir.path());
        write_task(provider.tasks_root(), "AL-10", "ten");
        write_task(provider.tasks_root(), "AL-02", "two");

        let response = provider.get_next_task().unwrap();
        assert_eq!(response.data.unwrap()["task_id"], "AL-02");
    }

    #[test]
    fn cache_task_never_clobbers_an_existing_file() {
        let dir = tempdir().unwrap();
        let provider = provider(dir.path());
        write_task(provider.tasks_root(), "AL-01", "original");

        let task = provider.get_task("AL-01").unwrap().unwrap();
        let mut renamed = task.clone();
        renamed.title = "changed".to_string();
        provider.cache_task(&renamed).unwrap();

        let reread = provider.get_task("AL-01").unwrap().unwrap();
        assert_eq!(reread.title, "original");
    }

    #[test]
    fn empty_tasks_root_recommends_creating_work() {
        let dir = tempdir().unwrap();
        let response = provider(dir.path()).get_next_task().unwrap();
        assert!(response.is_success());
        assert!(response.data.is_none());
    }
}
