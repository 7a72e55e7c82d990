//! In-memory task graph document.
//!
//! `TaskGraph` is the aggregate root for everything persisted in a store
//! file: the id counter, the task records and the client id index. All
//! mutations go through its methods so that `blockers`/`blocked` stay
//! reciprocal and the client id index never points at a missing task.
//!
//! Readiness is derived on every read: a task is ready when it is open and
//! none of its blockers that still exist are open.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    format_task_id, task_ordinal, CreateOutcome, DeleteOutcome, DependencyChange,
    HardDeleteReceipt, ListEntry, ListPage, ListQuery, ListView, Note, Task, TaskRow, TaskStatus,
    TaskView,
};

fn default_next_id() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGraph {
    #[serde(default = "default_next_id")]
    next_id: u64,
    #[serde(default)]
    tasks: BTreeMap<String, Task>,
    #[serde(default)]
    client_ids: BTreeMap<String, String>,
    #[serde(skip)]
    dirty: bool,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self {
            next_id: default_next_id(),
            tasks: BTreeMap::new(),
            client_ids: BTreeMap::new(),
            dirty: false,
        }
    }
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Tasks in allocation order
    pub fn tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| {
            let left = task_ordinal(&a.id).unwrap_or(u64::MAX);
            let right = task_ordinal(&b.id).unwrap_or(u64::MAX);
            left.cmp(&right).then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    pub fn client_task_id(&self, client_id: &str) -> Option<&str> {
        self.client_ids.get(client_id).map(String::as_str)
    }

    /// Whether any mutation happened since this document was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn require(&self, id: &str) -> Result<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Next unused `task-<n>`; fails once the counter cannot advance.
    fn allocate_id(&mut self) -> Result<String> {
        loop {
            let id = format_task_id(self.next_id);
            self.next_id = self.next_id.checked_add(1).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "task id counter exhausted at next_id={}",
                    self.next_id
                ))
            })?;
            if !self.tasks.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    pub fn is_ready(&self, task: &Task) -> bool {
        if !task.is_open() {
            return false;
        }
        task.blockers.iter().all(|blocker_id| {
            self.tasks
                .get(blocker_id)
                .map(|blocker| !blocker.is_open())
                .unwrap_or(true)
        })
    }

    pub fn view(&self, task: &Task) -> TaskView {
        TaskView {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            ready: self.is_ready(task),
            notes: task.notes.clone(),
            blockers: task.blockers.clone(),
            blocked: task.blocked.clone(),
            created_at: task.created_at.clone(),
            updated_at: task.updated_at.clone(),
            close_reason: task.close_reason.clone(),
            client_id: task.client_id.clone().unwrap_or_default(),
        }
    }

    pub fn row(&self, task: &Task) -> TaskRow {
        TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            ready: self.is_ready(task),
            blockers: task.blockers.clone(),
            blocked: task.blocked.clone(),
            notes_count: task.notes.len(),
            updated_at: task.updated_at.clone(),
        }
    }

    fn view_of(&self, id: &str) -> Result<TaskView> {
        Ok(self.view(self.require(id)?))
    }

    pub fn get(&self, id: &str) -> Result<TaskView> {
        self.view_of(id)
    }

    /// Create a task, or return the one already registered under `client_id`.
    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        client_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CreateOutcome> {
        let client_id = client_id.filter(|value| !value.is_empty());
        if let Some(existing) = client_id
            .and_then(|key| self.client_ids.get(key))
            .and_then(|task_id| self.tasks.get(task_id))
        {
            return Ok(CreateOutcome {
                created: false,
                task: self.view(existing),
            });
        }

        let id = self.allocate_id()?;
        let task = Task::new(
            id.clone(),
            title.to_string(),
            description.to_string(),
            client_id.map(str::to_string),
            now,
        );
        if let Some(key) = client_id {
            self.client_ids.insert(key.to_string(), id.clone());
        }
        let view = self.view(&task);
        self.tasks.insert(id, task);
        self.dirty = true;

        Ok(CreateOutcome {
            created: true,
            task: view,
        })
    }

    pub fn list(&self, query: &ListQuery) -> ListPage {
        let filtered: Vec<&Task> = self
            .tasks()
            .into_iter()
            .filter(|task| match query.view {
                ListView::Open => task.status == TaskStatus::Open,
                ListView::Closed => task.status == TaskStatus::Closed,
                ListView::Ready => self.is_ready(task),
                ListView::All => true,
            })
            .collect();

        let total = filtered.len();
        let page: Vec<ListEntry> = filtered
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|task| {
                if query.include_full {
                    ListEntry::Full(self.view(task))
                } else {
                    ListEntry::Compact(self.row(task))
                }
            })
            .collect();

        ListPage {
            view: query.view,
            total,
            offset: query.offset,
            count: page.len(),
            tasks: page,
        }
    }

    pub fn note_append(&mut self, id: &str, text: &str, now: DateTime<Utc>) -> Result<TaskView> {
        let task = self.require_mut(id)?;
        task.notes.push(Note {
            ts: now.into(),
            text: text.to_string(),
        });
        task.touch(now);
        self.dirty = true;
        self.view_of(id)
    }

    /// Record that `blocker_id` must leave `open` before `blocked_id` is ready.
    ///
    /// Re-adding an existing edge changes nothing. Cycles are not rejected.
    pub fn add_dependency(
        &mut self,
        blocker_id: &str,
        blocked_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DependencyChange> {
        if blocker_id == blocked_id {
            return Err(Error::InvalidArgument(
                "A task cannot depend on itself".to_string(),
            ));
        }

        let missing_on_blocked = !self
            .require(blocked_id)?
            .blockers
            .iter()
            .any(|id| id == blocker_id);
        let missing_on_blocker = !self
            .require(blocker_id)?
            .blocked
            .iter()
            .any(|id| id == blocked_id);
        let changed = missing_on_blocked || missing_on_blocker;

        if changed {
            let blocked = self.require_mut(blocked_id)?;
            if missing_on_blocked {
                blocked.blockers.push(blocker_id.to_string());
            }
            blocked.touch(now);

            let blocker = self.require_mut(blocker_id)?;
            if missing_on_blocker {
                blocker.blocked.push(blocked_id.to_string());
            }
            blocker.touch(now);

            self.dirty = true;
        }

        Ok(DependencyChange {
            changed,
            blocker_id: blocker_id.to_string(),
            blocked_id: blocked_id.to_string(),
        })
    }

    pub fn close(&mut self, id: &str, reason: &str, now: DateTime<Utc>) -> Result<TaskView> {
        let task = self.require_mut(id)?;
        task.status = TaskStatus::Closed;
        task.close_reason = reason.to_string();
        task.touch(now);
        self.dirty = true;
        self.view_of(id)
    }

    /// Mark a task deleted; its record and edges stay in place.
    pub fn soft_delete(&mut self, id: &str, now: DateTime<Utc>) -> Result<TaskView> {
        let task = self.require_mut(id)?;
        task.status = TaskStatus::Deleted;
        task.touch(now);
        self.dirty = true;
        self.view_of(id)
    }

    /// Remove a task and prune every edge and client id pointing at it.
    pub fn hard_delete(&mut self, id: &str) -> Result<HardDeleteReceipt> {
        let task = self
            .tasks
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        for blocker_id in &task.blockers {
            if let Some(blocker) = self.tasks.get_mut(blocker_id) {
                blocker.blocked.retain(|other| other != id);
            }
        }
        for blocked_id in &task.blocked {
            if let Some(blocked) = self.tasks.get_mut(blocked_id) {
                blocked.blockers.retain(|other| other != id);
            }
        }
        if let Some(client_id) = task.client_id.as_deref() {
            self.client_ids.remove(client_id);
        }
        self.client_ids.retain(|_, task_id| task_id.as_str() != id);
        self.dirty = true;

        Ok(HardDeleteReceipt {
            deleted: true,
            hard: true,
            id: id.to_string(),
        })
    }

    pub fn delete(&mut self, id: &str, hard: bool, now: DateTime<Utc>) -> Result<DeleteOutcome> {
        if hard {
            self.hard_delete(id).map(DeleteOutcome::Hard)
        } else {
            self.soft_delete(id, now).map(DeleteOutcome::Soft)
        }
    }
}
