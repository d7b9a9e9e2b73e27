use alfred_runtime::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn handle(workspace_root: &Path) -> Result<()> {
    let tasks_dir = workspace_root.join("tasks");
    let templates_dir = workspace_root.join("templates");
    fs::create_dir_all(&tasks_dir)?;
    fs::create_dir_all(&templates_dir)?;

    let config_path = Config::path_in(workspace_root);
    if config_path.exists() {
        println!("Workspace already initialized at {}", workspace_root.display());
    } else {
        Config::default().save_to(&config_path)?;
        println!("Initialized workspace at {}", workspace_root.display());
    }

    println!("  config:    {}", config_path.display());
    println!("  tasks:     {}", tasks_dir.display());
    println!("  templates: {} (drop '{{tool}}.{{state}}.md' files here to override prompts)", templates_dir.display());
    println!();
    println!("Next: add a task file to {} and run `alfred serve`.", tasks_dir.display());
    Ok(())
}
