//! Line-oriented task-file parser.
//!
//! The format is deliberately simple so humans can write task files by
//! hand:
//!
//! ```text
//! # TASK: AL-01
//! ## Title
//! Add cache invalidation
//! ## Context
//! ...
//! ## Implementation Details
//! ...
//! ## Acceptance Criteria
//! - old entries are evicted
//! ```
//!
//! Section headers are matched case-insensitively. `Title`, `Context`,
//! `Implementation Details` and `Acceptance Criteria` are required;
//! `Priority`, `Dev Notes`, `AC Verification` and `Dependencies` are
//! optional.

use crate::{Error, Result};
use alfred_types::{Task, TaskPriority, TaskStatus};

const REQUIRED_SECTIONS: [&str; 4] =
    ["title", "context", "implementation details", "acceptance criteria"];

/// Parse a task file into a [`Task`].
///
/// `task_status` is filled with [`TaskStatus::New`]; callers overlay
/// the authoritative status from the state store.
pub fn parse_task_file(path: &str, content: &str) -> Result<Task> {
    let parse_err = |message: String| Error::Parse {
        path: path.to_string(),
        message,
    };

    let mut lines = content.lines();
    let first = lines.next().unwrap_or_default().trim();
    let task_id = first
        .strip_prefix("# TASK:")
        .or_else(|| first.strip_prefix("# task:"))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            parse_err("first line must be '# TASK: {task_id}'".to_string())
        })?
        .to_string();

    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    for line in lines {
        if let Some(header) = line.trim().strip_prefix("## ") {
            sections.push((header.trim().to_lowercase(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line.to_string());
        }
        // prose before the first section header is ignored
    }

    let section = |name: &str| -> Option<String> {
        sections
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, body)| body.join("\n").trim().to_string())
    };

    for name in REQUIRED_SECTIONS {
        if section(name).filter(|s| !s.is_empty()).is_none() {
            return Err(parse_err(format!("missing required section '## {name}'")));
        }
    }

    let priority = match section("priority").as_deref() {
        None | Some("") => TaskPriority::default(),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "low" => TaskPriority::Low,
            "medium" => TaskPriority::Medium,
            "high" => TaskPriority::High,
            "critical" => TaskPriority::Critical,
            other => {
                return Err(parse_err(format!(
                    "unknown priority '{other}' (expected low, medium, high or critical)"
                )));
            }
        },
    };

    Ok(Task {
        task_id,
        title: section("title").unwrap_or_default(),
        context: section("context").unwrap_or_default(),
        implementation_details: section("implementation details").unwrap_or_default(),
        acceptance_criteria: list_items(&section("acceptance criteria").unwrap_or_default()),
        ac_verification_steps: list_items(&section("ac verification").unwrap_or_default()),
        dev_notes: section("dev notes").filter(|s| !s.is_empty()),
        priority,
        dependencies: list_items(&section("dependencies").unwrap_or_default()),
        task_status: TaskStatus::New,
    })
}

/// Render a task back into the file format, used to cache tasks
/// observed from remote providers and by task creation.
pub fn render_task_file(task: &Task) -> String {
    let mut out = format!("# TASK: {}\n\n", task.task_id);
    push_section(&mut out, "Title", &task.title);
    push_section(&mut out, "Context", &task.context);
    push_section(&mut out, "Implementation Details", &task.implementation_details);
    push_list_section(&mut out, "Acceptance Criteria", &task.acceptance_criteria);
    if task.priority != TaskPriority::default() {
        push_section(&mut out, "Priority", &task.priority.to_string());
    }
    if let Some(notes) = &task.dev_notes {
        push_section(&mut out, "Dev Notes", notes);
    }
    if !task.ac_verification_steps.is_empty() {
        push_list_section(&mut out, "AC Verification", &task.ac_verification_steps);
    }
    if !task.dependencies.is_empty() {
        push_list_section(&mut out, "Dependencies", &task.dependencies);
    }
    out
}

fn push_section(out: &mut String, header: &str, body: &str) {
    out.push_str(&format!("## {header}\n{body}\n\n"));
}

fn push_list_section(out: &mut String, header: &str, items: &[String]) {
    out.push_str(&format!("## {header}\n"));
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
    out.push('\n');
}

/// Bullet or numbered list items; bare non-empty lines count as single
/// items so sloppy task files still parse.
fn list_items(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(str::to_string)
                .unwrap_or_else(|| {
                    line.split_once(". ")
                        .filter(|(n, _)| n.chars().all(|c| c.is_ascii_digit()))
                        .map(|(_, rest)| rest.to_string())
                        .unwrap_or_else(|| line.to_string())
                })
        })
        .map(|item| item.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# TASK: AL-01

## Title
Add cache invalidation

## Context
The cache never evicts.

## Implementation Details
Add TTL-based eviction.

## Acceptance Criteria
- stale entries are evicted
- hit rate is unchanged

## Priority
high

## Dev Notes
Watch the clock source.

## AC Verification
1. run the eviction test
2. check the metrics

## Dependencies
- AL-00
";

    #[test]
    fn parses_all_sections() {
        let task = parse_task_file("AL-01.md", SAMPLE).unwrap();
        assert_eq!(task.task_id, "AL-01");
        assert_eq!(task.title, "Add cache invalidation");
        assert_eq!(task.acceptance_criteria.len(), 2);
        assert_eq!(task.ac_verification_steps, vec!["run the eviction test", "check the metrics"]);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.dev_notes.as_deref(), Some("Watch the clock source."));
        assert_eq!(task.dependencies, vec!["AL-00"]);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let content = SAMPLE.replace("## Title", "## TITLE").replace("## Context", "## context");
        let task = parse_task_file("AL-01.md", &content).unwrap();
        assert_eq!(task.title, "Add cache invalidation");
    }

    #[test]
    fn missing_required_section_is_an_error() {
        let content = SAMPLE.replace("## Context", "## Backstory");
        let err = parse_task_file("AL-01.md", &content).unwrap_err();
        assert!(err.to_string().contains("context"), "{err}");
    }

    #[test]
    fn missing_task_header_is_an_error() {
        let err = parse_task_file("AL-01.md", "## Title\nno header\n").unwrap_err();
        assert!(err.to_string().contains("# TASK:"), "{err}");
    }

    #[test]
    fn unknown_priority_is_an_error() {
        let content = SAMPLE.replace("high", "urgent");
        let err = parse_task_file("AL-01.md", &content).unwrap_err();
        assert!(err.to_string().contains("urgent"), "{err}");
    }

    #[test]
    fn render_then_parse_roundtrips() {
        let task = parse_task_file("AL-01.md", SAMPLE).unwrap();
        let rendered = render_task_file(&task);
        let reparsed = parse_task_file("AL-01.md", &rendered).unwrap();

        assert_eq!(reparsed.task_id, task.task_id);
        assert_eq!(reparsed.title, task.title);
        assert_eq!(reparsed.acceptance_criteria, task.acceptance_criteria);
        assert_eq!(reparsed.priority, task.priority);
        assert_eq!(reparsed.dependencies, task.dependencies);
    }
}
