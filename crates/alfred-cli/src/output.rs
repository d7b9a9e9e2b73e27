use alfred_types::TaskStatus;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Color a status for terminal display; plain text when piped.
pub fn styled_status(status: TaskStatus) -> String {
    if !std::io::stdout().is_terminal() {
        return status.to_string();
    }
    match status {
        TaskStatus::Done => status.to_string().green().to_string(),
        s if s.is_in_progress() => s.to_string().yellow().to_string(),
        s if s.is_ready() => s.to_string().cyan().to_string(),
        s => s.to_string().dimmed().to_string(),
    }
}
