//! Command-line interface for taskgraph
//!
//! This module defines the CLI structure using clap derive macros.
//! Command handlers live in [`task`].

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::model::{ListQuery, ListView};
use crate::output::OutputOptions;
use crate::paths::PathContext;
use crate::store::GraphStore;

mod task;

/// taskgraph - a persistent task dependency graph for agents
///
/// Tracks tasks, notes and blocker edges in a single JSON file that can be
/// shared by several processes.
#[derive(Parser, Debug)]
#[command(name = "taskgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store file (overrides every other location setting)
    #[arg(long, global = true, env = "TASKGRAPH_STORE")]
    pub store: Option<PathBuf>,

    /// Root directory for per-instance stores
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Instance id; with --output-dir selects <output-dir>/<instance-id>/tasks.json
    #[arg(long, global = true)]
    pub instance_id: Option<String>,

    /// Config file (defaults to ./.taskgraph.toml when present)
    #[arg(long, global = true, env = "TASKGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    Create {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Idempotency key; repeating it returns the existing task
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Show one task in full
    Show {
        /// Task id (e.g. task-3)
        id: String,
    },

    /// List tasks
    List {
        /// Which tasks to include (defaults to config, then open)
        #[arg(long, value_enum)]
        view: Option<ListView>,

        /// Include descriptions and notes
        #[arg(long)]
        full: bool,

        /// Maximum rows to return
        #[arg(long)]
        limit: Option<usize>,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Append a note to a task
    Note {
        /// Task id
        id: String,

        /// Note text
        text: String,
    },

    /// Dependency edges
    #[command(subcommand)]
    Dep(DepCommands),

    /// Close a task
    Close {
        /// Task id
        id: String,

        /// Why the task was closed
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Delete a task (soft by default)
    Delete {
        /// Task id
        id: String,

        /// Remove the record and every edge that mentions it
        #[arg(long)]
        hard: bool,
    },

    /// Run a raw tool call and print its response envelope
    Call {
        /// JSON arguments; read from stdin when omitted or "-"
        args: Option<String>,
    },

    /// Print the tool's function-calling schema
    Schema,

    /// Print the resolved store path
    Path,
}

/// Dependency subcommands
#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Record that BLOCKER must finish before BLOCKED
    Add {
        /// Task that must finish first
        blocker: String,

        /// Task that waits
        blocked: String,
    },
}

/// Layer CLI location flags over the config's
///
/// Any location flag replaces the config's explicit path, so
/// `--output-dir`/`--instance-id` are not shadowed by `[store] path`.
fn merge_path_context(
    mut context: PathContext,
    store: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    instance_id: Option<String>,
) -> PathContext {
    if output_dir.is_some() || instance_id.is_some() {
        context.tasks_graph_path = None;
    }
    if let Some(store) = store {
        context.tasks_graph_path = Some(store);
    }
    if let Some(output_dir) = output_dir {
        context.output_dir = Some(output_dir);
    }
    if let Some(instance_id) = instance_id {
        context.instance_id = Some(instance_id);
    }
    context
}

impl Cli {
    fn load_config(&self, cwd: &Path) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::load_from_dir(cwd)),
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let config = self.load_config(&cwd)?;

        let context = merge_path_context(
            config.path_context(),
            self.store,
            self.output_dir,
            self.instance_id,
        );
        let store = GraphStore::from_context(&context, &cwd)
            .with_lock_timeout(config.store.lock_timeout_ms);
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Create {
                title,
                description,
                client_id,
            } => task::run_create(
                &store,
                task::CreateOptions {
                    title,
                    description,
                    client_id,
                    output,
                },
            ),
            Commands::Show { id } => task::run_show(&store, task::ShowOptions { id, output }),
            Commands::List {
                view,
                full,
                limit,
                offset,
            } => task::run_list(
                &store,
                task::ListOptions {
                    query: ListQuery {
                        view: view.unwrap_or(config.list.default_view),
                        include_full: full,
                        limit: limit.or(config.list.default_limit),
                        offset,
                    },
                    output,
                },
            ),
            Commands::Note { id, text } => {
                task::run_note(&store, task::NoteOptions { id, text, output })
            }
            Commands::Dep(cmd) => match cmd {
                DepCommands::Add { blocker, blocked } => task::run_dep_add(
                    &store,
                    task::DepAddOptions {
                        blocker,
                        blocked,
                        output,
                    },
                ),
            },
            Commands::Close { id, reason } => {
                task::run_close(&store, task::CloseOptions { id, reason, output })
            }
            Commands::Delete { id, hard } => {
                task::run_delete(&store, task::DeleteOptions { id, hard, output })
            }
            Commands::Call { args } => task::run_call(&store, args),
            Commands::Schema => task::run_schema(),
            Commands::Path => task::run_path(&store, output),
        }
    }
}
