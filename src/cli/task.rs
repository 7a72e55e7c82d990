//! taskgraph command implementations.

use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::model::{DeleteOutcome, ListQuery};
use crate::output::{emit_raw, emit_success, format_list_entry, HumanOutput, OutputOptions};
use crate::store::GraphStore;
use crate::tool;

pub struct CreateOptions {
    pub title: String,
    pub description: String,
    pub client_id: Option<String>,
    pub output: OutputOptions,
}

pub struct ShowOptions {
    pub id: String,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub query: ListQuery,
    pub output: OutputOptions,
}

pub struct NoteOptions {
    pub id: String,
    pub text: String,
    pub output: OutputOptions,
}

pub struct DepAddOptions {
    pub blocker: String,
    pub blocked: String,
    pub output: OutputOptions,
}

pub struct CloseOptions {
    pub id: String,
    pub reason: String,
    pub output: OutputOptions,
}

pub struct DeleteOptions {
    pub id: String,
    pub hard: bool,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct StorePathOutput {
    path: PathBuf,
    lock_path: PathBuf,
    exists: bool,
}

pub fn run_create(store: &GraphStore, options: CreateOptions) -> Result<()> {
    let outcome = store.create(
        &options.title,
        &options.description,
        options.client_id.as_deref(),
    )?;

    let header = if outcome.created {
        "Task created"
    } else {
        "Task already exists for client id"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", outcome.task.id.as_str());
    human.push_summary("Title", outcome.task.title.as_str());
    human.push_next_step(format!("taskgraph show {}", outcome.task.id));

    emit_success(options.output, "create", &outcome, Some(&human))
}

pub fn run_show(store: &GraphStore, options: ShowOptions) -> Result<()> {
    let task = store.get(&options.id)?;

    let mut human = HumanOutput::for_task(format!("Task {}", task.id), &task);
    if !task.description.is_empty() {
        human.push_detail(task.description.as_str());
    }
    for note in &task.notes {
        human.push_detail(format!("[{}] {}", note.ts, note.text));
    }

    emit_success(options.output, "show", &task, Some(&human))
}

pub fn run_list(store: &GraphStore, options: ListOptions) -> Result<()> {
    let page = store.list(&options.query)?;

    let mut human = HumanOutput::new(format!("Tasks ({})", page.view));
    human.push_summary("Total", page.total.to_string());
    if page.count != page.total {
        human.push_summary(
            "Showing",
            format!("{}..{}", page.offset, page.offset + page.count),
        );
    }
    for entry in &page.tasks {
        human.push_detail(format_list_entry(entry));
    }

    emit_success(options.output, "list", &page, Some(&human))
}

pub fn run_note(store: &GraphStore, options: NoteOptions) -> Result<()> {
    let task = store.note_append(&options.id, &options.text)?;

    let mut human = HumanOutput::new("Note added");
    human.push_summary("ID", task.id.as_str());
    human.push_summary("Notes", task.notes.len().to_string());

    emit_success(options.output, "note", &task, Some(&human))
}

pub fn run_dep_add(store: &GraphStore, options: DepAddOptions) -> Result<()> {
    let change = store.dep_add(&options.blocker, &options.blocked)?;

    let header = if change.changed {
        "Dependency added"
    } else {
        "Dependency already present"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Blocker", change.blocker_id.as_str());
    human.push_summary("Blocked", change.blocked_id.as_str());

    emit_success(options.output, "dep add", &change, Some(&human))
}

pub fn run_close(store: &GraphStore, options: CloseOptions) -> Result<()> {
    let task = store.close(&options.id, &options.reason)?;
    let human = HumanOutput::for_task("Task closed", &task);
    emit_success(options.output, "close", &task, Some(&human))
}

pub fn run_delete(store: &GraphStore, options: DeleteOptions) -> Result<()> {
    let outcome = store.delete(&options.id, options.hard)?;

    let human = match &outcome {
        DeleteOutcome::Soft(task) => HumanOutput::for_task("Task deleted", task),
        DeleteOutcome::Hard(receipt) => {
            let mut human = HumanOutput::new("Task removed");
            human.push_summary("ID", receipt.id.as_str());
            human
        }
    };

    emit_success(options.output, "delete", &outcome, Some(&human))
}

/// Tool-call passthrough; failures are reported inside the envelope.
pub fn run_call(store: &GraphStore, args: Option<String>) -> Result<()> {
    let raw = match args.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(inline) => inline.to_string(),
    };

    let response = tool::invoke_json(store, &raw);
    emit_raw(&response.to_value())
}

pub fn run_schema() -> Result<()> {
    emit_raw(&tool::tool_definition())
}

pub fn run_path(store: &GraphStore, output: OutputOptions) -> Result<()> {
    let data = StorePathOutput {
        path: store.path().to_path_buf(),
        lock_path: store.lock_path(),
        exists: store.path().exists(),
    };

    if output.json {
        return emit_success(output, "path", &data, None);
    }
    if !output.quiet {
        println!("{}", data.path.display());
    }
    Ok(())
}
