use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "alfred")]
#[command(about = "Workflow orchestration for AI coding agents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Workspace root; defaults to ALFRED_PATH or ./.alfred
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server over stdio
    Serve,
    /// Initialize a workspace (config, tasks dir, template dir)
    Init,
    /// Inspect and manage tasks
    #[command(subcommand)]
    Task(TaskCommands),
    /// Show a task's workflow position and turn count
    Status {
        /// Task identifier, e.g. AL-01
        task_id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List every known task with its status
    List,
    /// Show one task definition in full
    Show {
        /// Task identifier, e.g. AL-01
        task_id: String,
    },
    /// Print the ranked next-task recommendation
    Next,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
