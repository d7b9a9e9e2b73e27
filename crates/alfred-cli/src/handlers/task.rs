use crate::TaskCommands;
use crate::output::styled_status;
use alfred_runtime::Runtime;
use anyhow::{Result, anyhow};
use std::path::Path;

pub fn handle(workspace_root: &Path, command: &TaskCommands) -> Result<()> {
    let runtime = Runtime::open(workspace_root)?;

    match command {
        TaskCommands::List => list(&runtime),
        TaskCommands::Show { task_id } => show(&runtime, task_id),
        TaskCommands::Next => next(&runtime),
    }
}

fn list(runtime: &Runtime) -> Result<()> {
    let tasks = runtime.provider().get_all_tasks()?;
    if tasks.is_empty() {
        println!("No tasks found under {}", runtime.tasks_root().display());
        return Ok(());
    }

    for task in tasks {
        println!(
            "{:<10} {:<24} {:<8} {}",
            task.task_id,
            styled_status(task.task_status),
            task.priority,
            task.title
        );
    }
    Ok(())
}

fn show(runtime: &Runtime, task_id: &str) -> Result<()> {
    let task = runtime
        .provider()
        .get_task(task_id)?
        .ok_or_else(|| anyhow!("task '{task_id}' not found"))?;

    println!("# {} — {}", task.task_id, task.title);
    println!();
    println!("Status:   {}", styled_status(task.task_status));
    println!("Priority: {}", task.priority);
    if !task.dependencies.is_empty() {
        println!("Depends:  {}", task.dependencies.join(", "));
    }
    println!();
    println!("## Context");
    println!("{}", task.context);
    println!();
    println!("## Implementation Details");
    println!("{}", task.implementation_details);
    println!();
    println!("## Acceptance Criteria");
    for criterion in &task.acceptance_criteria {
        println!("- {criterion}");
    }
    if let Some(notes) = &task.dev_notes {
        println!();
        println!("## Dev Notes");
        println!("{notes}");
    }
    Ok(())
}

fn next(runtime: &Runtime) -> Result<()> {
    let response = runtime.provider().get_next_task()?;
    println!("{}", response.message);
    Ok(())
}
