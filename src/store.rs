//! File-backed task graph store
//!
//! Every operation is one full cycle against the backing file:
//!
//! 1. Acquire the advisory lock on `<file>.lock`
//! 2. Load the whole document (a missing or zero-length file is an empty graph)
//! 3. Apply at most one mutation through [`TaskGraph`]
//! 4. If anything changed, write the whole document back atomically
//!
//! Nothing is cached between calls. The document is written with sorted
//! keys, 2-space indentation and a trailing newline so it diffs cleanly.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::TaskGraph;
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{
    CreateOutcome, DeleteOutcome, DependencyChange, ListPage, ListQuery, TaskView,
};
use crate::paths::{resolve_store_path, PathContext};

/// Render a graph as the canonical on-disk document
///
/// Going through `serde_json::Value` sorts every object's keys.
pub fn to_canonical_json(graph: &TaskGraph) -> Result<String> {
    let value = serde_json::to_value(graph)?;
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    Ok(json)
}

#[derive(Debug, Clone)]
pub struct GraphStore {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl GraphStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Open the store whose location `context` resolves to
    pub fn from_context(context: &PathContext, process_cwd: &Path) -> Self {
        Self::new(resolve_store_path(context, process_cwd))
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        lock::lock_path_for(&self.path)
    }

    /// Read the current document without locking
    pub fn load(&self) -> Result<TaskGraph> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing; starting empty");
                return Ok(TaskGraph::new());
            }
            Err(err) => return Err(err.into()),
        };

        if content.is_empty() {
            return Ok(TaskGraph::new());
        }

        serde_json::from_str(&content).map_err(|err| Error::StorageCorruption {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn save(&self, graph: &TaskGraph) -> Result<()> {
        let json = to_canonical_json(graph)?;
        lock::write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), tasks = graph.len(), "saved task store");
        Ok(())
    }

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TaskGraph) -> Result<T>,
    {
        if !self.path.exists() {
            return f(&TaskGraph::new());
        }

        let _lock = FileLock::acquire(self.lock_path(), self.lock_timeout_ms)?;
        let graph = self.load()?;
        f(&graph)
    }

    /// Lock, load, apply `f`, save if it changed anything.
    ///
    /// With no store file yet, `f` first runs against an empty graph, so a
    /// failing or no-op call creates neither directories nor the lock file.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: Fn(&mut TaskGraph) -> Result<T>,
    {
        if !self.path.exists() {
            let mut scratch = TaskGraph::new();
            let result = f(&mut scratch)?;
            if !scratch.is_dirty() {
                return Ok(result);
            }
        }

        let _lock = FileLock::acquire(self.lock_path(), self.lock_timeout_ms)?;
        let mut graph = self.load()?;

        let result = f(&mut graph)?;
        if graph.is_dirty() {
            self.save(&graph)?;
        }

        Ok(result)
    }

    pub fn create(
        &self,
        title: &str,
        description: &str,
        client_id: Option<&str>,
    ) -> Result<CreateOutcome> {
        let outcome =
            self.update(|graph| graph.create(title, description, client_id, Utc::now()))?;
        if outcome.created {
            info!(id = %outcome.task.id, "created task");
        } else {
            debug!(id = %outcome.task.id, "client id matched existing task");
        }
        Ok(outcome)
    }

    pub fn get(&self, id: &str) -> Result<TaskView> {
        self.read(|graph| graph.get(id))
    }

    pub fn list(&self, query: &ListQuery) -> Result<ListPage> {
        self.read(|graph| Ok(graph.list(query)))
    }

    pub fn note_append(&self, id: &str, note: &str) -> Result<TaskView> {
        self.update(|graph| graph.note_append(id, note, Utc::now()))
    }

    pub fn dep_add(&self, blocker_id: &str, blocked_id: &str) -> Result<DependencyChange> {
        let change =
            self.update(|graph| graph.add_dependency(blocker_id, blocked_id, Utc::now()))?;
        if change.changed {
            info!(blocker = blocker_id, blocked = blocked_id, "added dependency");
        }
        Ok(change)
    }

    pub fn close(&self, id: &str, reason: &str) -> Result<TaskView> {
        let view = self.update(|graph| graph.close(id, reason, Utc::now()))?;
        info!(id, "closed task");
        Ok(view)
    }

    pub fn delete(&self, id: &str, hard: bool) -> Result<DeleteOutcome> {
        let outcome = self.update(|graph| graph.delete(id, hard, Utc::now()))?;
        info!(id, hard, "deleted task");
        Ok(outcome)
    }
}
