//! Task records and the views returned to callers.
//!
//! `Task` is the persisted shape. `TaskView` and `TaskRow` are what callers
//! see: they carry the derived `ready` flag, which is never written to disk.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Timelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Prefix shared by every allocated task id (`task-1`, `task-2`, ...)
pub const TASK_ID_PREFIX: &str = "task-";

/// Build the id for the `n`th allocated task
pub fn format_task_id(n: u64) -> String {
    format!("{TASK_ID_PREFIX}{n}")
}

/// Allocation ordinal of a task id, if it follows the `task-<n>` format
pub fn task_ordinal(id: &str) -> Option<u64> {
    id.strip_prefix(TASK_ID_PREFIX)?.parse().ok()
}

/// An RFC 3339 instant that keeps the text it was read from.
///
/// Documents written by other tools use `+00:00` offsets and microsecond
/// precision; re-saving must not rewrite timestamps nobody touched. New
/// timestamps use the same layout: `2024-05-01T10:00:00.123456+00:00`,
/// with the fraction dropped on whole seconds. Comparison is by instant.
#[derive(Debug, Clone)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    text: String,
}

impl Timestamp {
    pub fn parse(text: &str) -> Result<Self, chrono::ParseError> {
        let instant = DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc);
        Ok(Self {
            instant,
            text: text.to_string(),
        })
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        let instant = value.trunc_subsecs(6);
        let format = if instant.nanosecond() == 0 {
            SecondsFormat::Secs
        } else {
            SecondsFormat::Micros
        };
        Self {
            instant,
            text: instant.to_rfc3339_opts(format, false),
        }
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl PartialEq<DateTime<Utc>> for Timestamp {
    fn eq(&self, other: &DateTime<Utc>) -> bool {
        self.instant == *other
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text)
            .map_err(|err| serde::de::Error::custom(format!("invalid timestamp {text:?}: {err}")))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    Closed,
    Deleted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub ts: Timestamp,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Tasks that must leave `open` before this one is ready
    #[serde(default)]
    pub blockers: Vec<String>,
    /// Tasks waiting on this one
    #[serde(default)]
    pub blocked: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub close_reason: String,
    #[serde(default, with = "client_id_field")]
    pub client_id: Option<String>,
}

impl Task {
    pub fn new(
        id: String,
        title: String,
        description: String,
        client_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status: TaskStatus::Open,
            notes: Vec::new(),
            blockers: Vec::new(),
            blocked: Vec::new(),
            created_at: now.into(),
            updated_at: now.into(),
            close_reason: String::new(),
            client_id,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.into();
    }
}

/// The client id is stored as an empty string when absent.
mod client_id_field {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|value| !value.is_empty()))
    }
}

/// Filter applied by `list`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListView {
    #[default]
    Open,
    Closed,
    Ready,
    All,
}

impl ListView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Ready => "ready",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListView {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "ready" => Ok(Self::Ready),
            "all" => Ok(Self::All),
            other => Err(Error::InvalidArgument(format!("Unsupported view: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub view: ListView,
    pub include_full: bool,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Full task view, including description, notes and the derived `ready` flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub ready: bool,
    pub notes: Vec<Note>,
    pub blockers: Vec<String>,
    pub blocked: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub close_reason: String,
    pub client_id: String,
}

/// Compact list row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub ready: bool,
    pub blockers: Vec<String>,
    pub blocked: Vec<String>,
    pub notes_count: usize,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListEntry {
    Full(TaskView),
    Compact(TaskRow),
}

impl ListEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Full(view) => &view.id,
            Self::Compact(row) => &row.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub view: ListView,
    /// Filtered size before pagination
    pub total: usize,
    pub offset: usize,
    /// Rows on this page
    pub count: usize,
    pub tasks: Vec<ListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOutcome {
    pub created: bool,
    pub task: TaskView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
    pub changed: bool,
    pub blocker_id: String,
    pub blocked_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardDeleteReceipt {
    pub deleted: bool,
    pub hard: bool,
    pub id: String,
}

/// Soft deletes report the surviving task; hard deletes only a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeleteOutcome {
    Soft(TaskView),
    Hard(HardDeleteReceipt),
}
