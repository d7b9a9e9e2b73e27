use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

pub(crate) const LOCK_FILE: &str = ".state.lock";

/// Exclusive advisory lock over one task directory.
///
/// Acquisition is non-blocking: contention is surfaced to the caller
/// instead of queueing, so a stuck invocation can never wedge the whole
/// engine. The lock file itself is never removed -- removing it on
/// release would race against a concurrent acquirer opening the old
/// inode.
#[derive(Debug)]
pub struct TaskLock {
    file: File,
}

impl TaskLock {
    pub(crate) fn acquire(task_dir: &Path, task_id: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(task_dir.join(LOCK_FILE))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(Error::LockContention {
                    task_id: task_id.to_string(),
                })
            }
            Err(err) => Err(Error::Io(err)),
        }
    }
}

impl Drop for TaskLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_succeeds_on_fresh_directory() {
        let dir = tempdir().unwrap();
        let lock = TaskLock::acquire(dir.path(), "AL-01");
        assert!(lock.is_ok());
    }

    #[test]
    fn second_acquire_reports_contention() {
        let dir = tempdir().unwrap();
        let _held = TaskLock::acquire(dir.path(), "AL-01").unwrap();

        match TaskLock::acquire(dir.path(), "AL-01") {
            Err(Error::LockContention { task_id }) => assert_eq!(task_id, "AL-01"),
            other => panic!("expected contention, got {other:?}"),
        }
    }

    #[test]
    fn dropping_the_lock_releases_it() {
        let dir = tempdir().unwrap();
        {
            let _held = TaskLock::acquire(dir.path(), "AL-01").unwrap();
        }
        assert!(TaskLock::acquire(dir.path(), "AL-01").is_ok());
    }

    #[test]
    fn lock_file_survives_release() {
        let dir = tempdir().unwrap();
        {
            let _held = TaskLock::acquire(dir.path(), "AL-01").unwrap();
        }
        assert!(dir.path().join(LOCK_FILE).exists());
    }
}
