//! TestWorld pattern for declarative integration test setup.
//!
//! Provides a fluent interface for:
//! - creating isolated workspaces under a temp directory
//! - seeding task files and configuration
//! - opening runtimes and executing the CLI with proper context

use alfred_runtime::{Config, Runtime};
use anyhow::Result;
use assert_cmd::Command;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures;

/// Builder for constructing TestWorld with fine-grained control.
pub struct TestWorldBuilder {
    autonomous_mode: bool,
    skip_workspace_creation: bool,
    env_vars: HashMap<String, String>,
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self {
            autonomous_mode: false,
            skip_workspace_creation: false,
            env_vars: HashMap::new(),
        }
    }

    /// Run every review with the human gate bypassed.
    pub fn autonomous(mut self) -> Self {
        self.autonomous_mode = true;
        self
    }

    /// Skip workspace directory creation, for fresh-install scenarios.
    pub fn without_workspace(mut self) -> Self {
        self.skip_workspace_creation = true;
        self
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> TestWorld {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let workspace_root = base_path.join(".alfred");

        if !self.skip_workspace_creation {
            fs::create_dir_all(&workspace_root).expect("Failed to create workspace dir");
            let config = Config {
                autonomous_mode: self.autonomous_mode,
                ..Config::default()
            };
            config
                .save_to(&Config::path_in(&workspace_root))
                .expect("Failed to write config");
        }

        TestWorld {
            temp_dir,
            cwd: base_path,
            workspace_root,
            env_vars: self.env_vars,
        }
    }
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative test environment.
///
/// # Example
/// ```no_run
/// use alfred_testing::TestWorld;
///
/// let world = TestWorld::new();
/// world.write_task("AL-01", "Add cache invalidation");
/// let runtime = world.runtime();
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    cwd: PathBuf,
    workspace_root: PathBuf,
    env_vars: HashMap<String, String>,
}

impl TestWorld {
    pub fn new() -> Self {
        TestWorldBuilder::new().build()
    }

    pub fn builder() -> TestWorldBuilder {
        TestWorldBuilder::new()
    }

    /// The directory CLI commands run from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn tasks_root(&self) -> PathBuf {
        self.workspace_root.join("tasks")
    }

    /// Seed a well-formed task file and return its path.
    pub fn write_task(&self, task_id: &str, title: &str) -> PathBuf {
        let tasks_root = self.tasks_root();
        fs::create_dir_all(&tasks_root).expect("Failed to create tasks dir");
        let path = tasks_root.join(format!("{task_id}.md"));
        fs::write(&path, fixtures::task_markdown(task_id, title)).expect("Failed to write task");
        path
    }

    /// Open a runtime over this world's workspace.
    pub fn runtime(&self) -> Runtime {
        Runtime::open(&self.workspace_root).expect("Failed to open runtime")
    }

    /// Run the alfred CLI with this world's workspace and environment.
    pub fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut cmd = Command::cargo_bin("alfred")?;
        cmd.current_dir(&self.cwd)
            .arg("--workspace")
            .arg(&self.workspace_root)
            .args(args);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        Ok(cmd.output()?)
    }

    /// Keep the temp directory alive explicitly (documents intent at
    /// call sites that only use the paths).
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
