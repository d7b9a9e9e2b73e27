use crate::lock::TaskLock;
use crate::{Error, Result};
use alfred_types::{TaskManifest, TaskState};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const STATE_FILE: &str = "task_state.json";
pub(crate) const MANIFEST_FILE: &str = "manifest.json";
pub(crate) const SCRATCHPAD_FILE: &str = "scratchpad.md";
pub(crate) const TURNS_DIR: &str = "turns";

/// Handle over the workspace's on-disk task records.
///
/// The store is cheap to clone around (it is just a root path); all
/// consistency comes from the per-task advisory lock and the atomic
/// write discipline, not from in-process state.
#[derive(Debug, Clone)]
pub struct TaskStore {
    root: PathBuf,
}

impl TaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn task_dir(&self, task_id: &str) -> Result<PathBuf> {
        validate_task_id(task_id)?;
        Ok(self.root.join(task_id))
    }

    /// Create the task directory (and turn log directory) if missing.
    pub fn ensure_task_dir(&self, task_id: &str) -> Result<PathBuf> {
        let dir = self.task_dir(task_id)?;
        fs::create_dir_all(dir.join(TURNS_DIR))?;
        Ok(dir)
    }

    /// Take the task's exclusive advisory lock, non-blocking.
    pub fn lock_task(&self, task_id: &str) -> Result<TaskLock> {
        let dir = self.ensure_task_dir(task_id)?;
        TaskLock::acquire(&dir, task_id)
    }

    /// Load the persisted TaskState, if the task has ever been touched.
    pub fn load_state(&self, task_id: &str) -> Result<Option<TaskState>> {
        let path = self.task_dir(task_id)?.join(STATE_FILE);
        read_json_opt(&path)
    }

    /// Load the TaskState, creating the initial record on first touch.
    pub fn load_or_init_state(&self, task_id: &str) -> Result<TaskState> {
        match self.load_state(task_id)? {
            Some(state) => Ok(state),
            None => Ok(TaskState::new(task_id)),
        }
    }

    pub fn save_state(&self, state: &TaskState) -> Result<()> {
        let dir = self.ensure_task_dir(&state.task_id)?;
        write_json_atomic(&dir.join(STATE_FILE), state)
    }

    pub fn load_manifest(&self, task_id: &str) -> Result<Option<TaskManifest>> {
        let path = self.task_dir(task_id)?.join(MANIFEST_FILE);
        read_json_opt(&path)
    }

    pub(crate) fn save_manifest(&self, manifest: &TaskManifest) -> Result<()> {
        let dir = self.ensure_task_dir(&manifest.task_id)?;
        write_json_atomic(&dir.join(MANIFEST_FILE), manifest)
    }

    /// Record the task's current workflow state in the manifest.
    pub fn update_manifest_state(&self, task_id: &str, current_state: &str) -> Result<()> {
        let mut manifest = self
            .load_manifest(task_id)?
            .unwrap_or_else(|| TaskManifest::new(task_id));
        manifest.current_state = current_state.to_string();
        manifest.last_updated = alfred_types::now_rfc3339();
        self.save_manifest(&manifest)
    }

    pub(crate) fn turns_dir(&self, task_id: &str) -> Result<PathBuf> {
        Ok(self.task_dir(task_id)?.join(TURNS_DIR))
    }
}

/// Reject task ids that would escape or mangle the workspace layout.
fn validate_task_id(task_id: &str) -> Result<()> {
    let unsafe_id = task_id.is_empty()
        || task_id.starts_with('.')
        || task_id
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control());
    if unsafe_id {
        Err(Error::InvalidTaskId(task_id.to_string()))
    } else {
        Ok(())
    }
}

/// Write a JSON record via a sibling temp file and an atomic rename.
///
/// Readers observe either the previous or the new file, never a
/// partial one. The caller holds the task lock, so the fixed temp name
/// cannot collide with another writer.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_vec_pretty(value).map_err(Error::Serialization)?;
    write_atomic(path, &contents)
}

pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

pub(crate) fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let value = serde_json::from_str(&contents).map_err(|source| Error::Corrupt {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Some(value))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::Io(err)),
    }
}
