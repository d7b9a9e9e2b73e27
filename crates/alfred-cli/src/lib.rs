mod args;
mod handlers;
mod output;

pub use args::{Cli, Commands, LogLevel, TaskCommands};

use alfred_runtime::resolve_workspace_root;
use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);
    let workspace_root = resolve_workspace_root(cli.workspace.as_deref());

    match cli.command {
        Commands::Serve => handlers::serve::handle(&workspace_root),
        Commands::Init => handlers::init::handle(&workspace_root),
        Commands::Task(command) => handlers::task::handle(&workspace_root, &command),
        Commands::Status { task_id } => handlers::status::handle(&workspace_root, &task_id),
    }
}

fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    // Logs go to stderr so the MCP stdio channel stays clean.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
