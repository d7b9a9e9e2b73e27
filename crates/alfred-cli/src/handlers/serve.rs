use alfred_sdk::{Client, mcp};
use anyhow::{Context, Result};
use std::path::Path;

pub fn handle(workspace_root: &Path) -> Result<()> {
    let client = Client::connect(workspace_root)
        .with_context(|| format!("cannot open workspace at {}", workspace_root.display()))?;
    tracing::info!(workspace = %workspace_root.display(), "MCP server starting on stdio");
    mcp::run_server(client)
}
