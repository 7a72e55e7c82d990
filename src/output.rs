//! Output rendering for taskgraph CLI commands.
//!
//! `--json` prints a versioned envelope around the command's data; otherwise
//! a short human summary is printed unless `--quiet` is set.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};
use crate::model::{ListEntry, TaskView};

pub const SCHEMA_VERSION: &str = "taskgraph.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable rendering of a command result
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }

    /// Summary block shared by every command that returns a single task
    pub fn for_task(header: impl Into<String>, task: &TaskView) -> Self {
        let mut human = Self::new(header);
        human.push_summary("ID", task.id.as_str());
        human.push_summary("Title", task.title.as_str());
        human.push_summary("Status", task.status.as_str());
        human.push_summary("Ready", if task.ready { "yes" } else { "no" });
        if !task.blockers.is_empty() {
            human.push_summary("Blocked by", task.blockers.join(", "));
        }
        if !task.blocked.is_empty() {
            human.push_summary("Blocks", task.blocked.join(", "));
        }
        if !task.close_reason.is_empty() {
            human.push_summary("Close reason", task.close_reason.as_str());
        }
        if !task.client_id.is_empty() {
            human.push_summary("Client ID", task.client_id.as_str());
        }
        human
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    error: JsonError,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let payload = SuccessEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Print a value as pretty JSON with no envelope
pub fn emit_raw<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);

    if json {
        let payload = ErrorEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: JsonError::from(err),
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    if !output.summary.is_empty() {
        lines.push(String::new());
        for (key, value) in &output.summary {
            lines.push(format!("  {key}: {value}"));
        }
    }
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// One line per list entry: `[status] id title (blocked by: ...)`
pub fn format_list_entry(entry: &ListEntry) -> String {
    let (status, id, title, ready, blockers) = match entry {
        ListEntry::Full(task) => (
            task.status.as_str(),
            task.id.as_str(),
            task.title.as_str(),
            task.ready,
            &task.blockers,
        ),
        ListEntry::Compact(row) => (
            row.status.as_str(),
            row.id.as_str(),
            row.title.as_str(),
            row.ready,
            &row.blockers,
        ),
    };

    let marker = if ready { "*" } else { " " };
    let mut line = format!("{marker}[{status}] {id} {title}");
    if !blockers.is_empty() {
        line.push_str(&format!(" (blocked by: {})", blockers.join(", ")));
    }
    line
}

/// Command name for error envelopes, recovered before clap parses
pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(args: impl IntoIterator<Item = String>) -> String {
    // Global flags that consume the next argument.
    const VALUE_FLAGS: [&str; 4] = ["--store", "--output-dir", "--instance-id", "--config"];

    let mut args = args.into_iter();
    let mut words = Vec::new();
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        words.push(arg);
        if words.len() == 2 || words[0] != "dep" {
            break;
        }
    }

    if words.is_empty() {
        "taskgraph".to_string()
    } else {
        words.join(" ")
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound(_) => vec!["taskgraph list --view all".to_string()],
        Error::StorageCorruption { path, .. } => vec![format!(
            "inspect or move aside {} then retry",
            path.display()
        )],
        Error::LockFailed(path) => vec![format!(
            "another process holds {}; retry shortly",
            path.display()
        )],
        Error::InvalidConfig(_) => vec!["fix .taskgraph.toml then retry".to_string()],
        _ => Vec::new(),
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskRow, TaskStatus};
    use chrono::Utc;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_name_skips_global_flags_and_values() {
        assert_eq!(
            command_name_from(args(&["--store", "/tmp/x.json", "--json", "show", "task-1"])),
            "show"
        );
        assert_eq!(command_name_from(args(&["dep", "add", "task-1", "task-2"])), "dep add");
        assert_eq!(command_name_from(args(&["--json"])), "taskgraph");
    }

    #[test]
    fn human_output_lists_sections_in_order() {
        let mut human = HumanOutput::new("Tasks");
        human.push_summary("Total", "2");
        human.push_detail("task-1");
        human.push_next_step("taskgraph show task-1");

        let text = format_human(&human);
        assert!(text.starts_with("Tasks\n"));
        let total = text.find("Total: 2").unwrap();
        let details = text.find("Details:").unwrap();
        let next = text.find("Next steps:").unwrap();
        assert!(total < details && details < next);
    }

    #[test]
    fn list_entry_line_marks_ready_and_blockers() {
        let row = TaskRow {
            id: "task-2".into(),
            title: "Ship".into(),
            status: TaskStatus::Open,
            ready: false,
            blockers: vec!["task-1".into()],
            blocked: Vec::new(),
            notes_count: 0,
            updated_at: Utc::now().into(),
        };
        assert_eq!(
            format_list_entry(&ListEntry::Compact(row)),
            " [open] task-2 Ship (blocked by: task-1)"
        );
    }
}
