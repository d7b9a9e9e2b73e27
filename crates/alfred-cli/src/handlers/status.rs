use crate::output::styled_status;
use alfred_runtime::Runtime;
use anyhow::Result;
use std::path::Path;

pub fn handle(workspace_root: &Path, task_id: &str) -> Result<()> {
    let runtime = Runtime::open(workspace_root)?;

    let Some(state) = runtime.store().load_state(task_id)? else {
        println!("Task '{task_id}' has no workflow history yet.");
        return Ok(());
    };

    println!("Task:   {}", state.task_id);
    println!("Status: {}", styled_status(state.task_status));
    match &state.active_tool_state {
        Some(workflow) => {
            println!("Tool:   {}", workflow.tool_name);
            println!("State:  {}", workflow.current_state);
        }
        None => println!("Tool:   (no workflow in progress)"),
    }

    if let Some(manifest) = runtime.store().load_manifest(task_id)? {
        println!("Turns:  {}", manifest.total_turns);
        if !manifest.latest_turns_by_state.is_empty() {
            println!();
            println!("Latest turn per state:");
            for (state_name, turn) in &manifest.latest_turns_by_state {
                println!("  {:<32} turn {}", state_name, turn);
            }
        }
    }

    if !state.completed_tool_outputs.is_empty() {
        println!();
        println!(
            "Completed phases: {}",
            state
                .completed_tool_outputs
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}
