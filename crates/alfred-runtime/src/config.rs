use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolve the workspace root based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. ALFRED_PATH environment variable (with tilde expansion)
/// 3. `.alfred` in the current directory (project-local engine state)
pub fn resolve_workspace_root(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return expand_tilde(path);
    }

    if let Ok(env_path) = std::env::var("ALFRED_PATH") {
        return expand_tilde(&env_path);
    }

    PathBuf::from(".alfred")
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider kind; only "local" ships in-tree, remote trackers plug
    /// in through the TaskProvider trait.
    pub kind: String,
    /// Task definition directory. Defaults to `{workspace_root}/tasks`.
    #[serde(default)]
    pub tasks_root: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "local".to_string(),
            tasks_root: None,
        }
    }
}

/// Engine configuration, read once at startup and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// When set, AI approval also fires the human gate so a workflow
    /// can run end-to-end without a human in the loop.
    #[serde(default)]
    pub autonomous_mode: bool,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    pub fn load(workspace_root: &Path) -> Result<Self> {
        Self::load_from(&Self::path_in(workspace_root))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("cannot create {}: {e}", parent.display())))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("cannot write {}: {e}", path.display())))?;
        Ok(())
    }

    pub fn path_in(workspace_root: &Path) -> PathBuf {
        workspace_root.join("config.toml")
    }

    /// The task definition directory, after defaulting.
    pub fn tasks_root(&self, workspace_root: &Path) -> PathBuf {
        self.provider
            .tasks_root
            .clone()
            .unwrap_or_else(|| workspace_root.join("tasks"))
    }
}
