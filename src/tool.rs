//! Tool invocation contract.
//!
//! An agent's tool layer hands over one JSON object per call:
//! `{op, id?, title?, description?, client_id?, view?, include_full?, limit?,
//! offset?, note?, blocker_id?, blocked_id?, reason?, hard?}`.
//! [`execute`] runs it against a [`GraphStore`] and returns the op's result
//! as plain JSON. [`invoke`] wraps that into an envelope that never fails,
//! so store errors can be reported back to the model as tool output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, JsonError, Result};
use crate::model::{ListQuery, ListView};
use crate::store::GraphStore;

/// Name the tool is registered under
pub const TOOL_NAME: &str = "tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Get,
    List,
    NoteAppend,
    DepAdd,
    Close,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::Get,
        Operation::List,
        Operation::NoteAppend,
        Operation::DepAdd,
        Operation::Close,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::List => "list",
            Self::NoteAppend => "note_append",
            Self::DepAdd => "dep_add",
            Self::Close => "close",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == value)
            .ok_or_else(|| Error::InvalidArgument(format!("Unsupported op: {value}")))
    }
}

/// One tool call's arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_full: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard: Option<bool>,
}

impl ToolRequest {
    pub fn new(op: Operation) -> Self {
        Self {
            op: op.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Parse raw tool arguments; shape errors become `InvalidArgument`
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidArgument(
                "tool arguments must be a JSON object".to_string(),
            ));
        }
        if value.get("op").is_none() {
            return Err(Error::InvalidArgument(
                "Missing 'op' argument in tasks tool call.".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|err| Error::InvalidArgument(format!("invalid tool arguments: {err}")))
    }

    pub fn operation(&self) -> Result<Operation> {
        self.op.parse()
    }

    fn require<'a>(field: &'a Option<String>, name: &str, op: Operation) -> Result<&'a str> {
        field.as_deref().ok_or_else(|| {
            Error::InvalidArgument(format!("missing required argument '{name}' for op '{op}'"))
        })
    }

    /// List parameters with defaults applied
    pub fn list_query(&self) -> Result<ListQuery> {
        let view = match self.view.as_deref() {
            Some(view) => view.parse()?,
            None => ListView::default(),
        };
        let limit = match self.limit {
            Some(limit) if limit < 0 => {
                return Err(Error::InvalidArgument(format!(
                    "limit must be non-negative, got {limit}"
                )))
            }
            Some(limit) => Some(usize::try_from(limit).unwrap_or(usize::MAX)),
            None => None,
        };
        let offset = self
            .offset
            .map(|offset| usize::try_from(offset.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(0);

        Ok(ListQuery {
            view,
            include_full: self.include_full.unwrap_or(false),
            limit,
            offset,
        })
    }
}

/// Run one request and return its result as JSON
pub fn execute(store: &GraphStore, request: &ToolRequest) -> Result<Value> {
    let op = request.operation()?;
    debug!(op = %op, "executing tasks tool call");

    let value = match op {
        Operation::Create => {
            let title = ToolRequest::require(&request.title, "title", op)?;
            let description = request.description.as_deref().unwrap_or("");
            serde_json::to_value(store.create(title, description, request.client_id.as_deref())?)?
        }
        Operation::Get => {
            let id = ToolRequest::require(&request.id, "id", op)?;
            serde_json::to_value(store.get(id)?)?
        }
        Operation::List => serde_json::to_value(store.list(&request.list_query()?)?)?,
        Operation::NoteAppend => {
            let id = ToolRequest::require(&request.id, "id", op)?;
            let note = ToolRequest::require(&request.note, "note", op)?;
            serde_json::to_value(store.note_append(id, note)?)?
        }
        Operation::DepAdd => {
            let blocker_id = ToolRequest::require(&request.blocker_id, "blocker_id", op)?;
            let blocked_id = ToolRequest::require(&request.blocked_id, "blocked_id", op)?;
            serde_json::to_value(store.dep_add(blocker_id, blocked_id)?)?
        }
        Operation::Close => {
            let id = ToolRequest::require(&request.id, "id", op)?;
            let reason = request.reason.as_deref().unwrap_or("");
            serde_json::to_value(store.close(id, reason)?)?
        }
        Operation::Delete => {
            let id = ToolRequest::require(&request.id, "id", op)?;
            serde_json::to_value(store.delete(id, request.hard.unwrap_or(false))?)?
        }
    };

    Ok(value)
}

/// Result envelope handed back to the tool-calling layer
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub ok: bool,
    pub op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

impl ToolResponse {
    pub fn success(op: impl Into<String>, result: Value) -> Self {
        Self {
            ok: true,
            op: Some(op.into()),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(op: Option<String>, err: &Error) -> Self {
        Self {
            ok: false,
            op,
            result: None,
            error: Some(JsonError::from(err)),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            json!({ "ok": false, "op": self.op, "error": { "kind": "json_error", "message": err.to_string() } })
        })
    }
}

/// Execute raw tool arguments, folding any failure into the envelope
pub fn invoke(store: &GraphStore, args: Value) -> ToolResponse {
    let op_name = args
        .get("op")
        .and_then(Value::as_str)
        .map(str::to_string);

    let outcome = ToolRequest::from_value(args).and_then(|request| execute(store, &request));
    match outcome {
        Ok(result) => ToolResponse::success(op_name.unwrap_or_default(), result),
        Err(err) => {
            debug!(error = %err, "tasks tool call failed");
            ToolResponse::failure(op_name, &err)
        }
    }
}

/// Like [`invoke`], starting from the raw argument string
pub fn invoke_json(store: &GraphStore, raw: &str) -> ToolResponse {
    match serde_json::from_str::<Value>(raw) {
        Ok(args) => invoke(store, args),
        Err(err) => ToolResponse::failure(
            None,
            &Error::InvalidArgument(format!("Error parsing tool call arguments: {err}")),
        ),
    }
}

/// Function-calling schema for the `tasks` tool
pub fn tool_definition() -> Value {
    let ops: Vec<&str> = Operation::ALL.iter().map(Operation::as_str).collect();
    let views: Vec<&str> = [ListView::Open, ListView::Ready, ListView::Closed, ListView::All]
        .iter()
        .map(ListView::as_str)
        .collect();

    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Manage a lightweight task graph without shell commands. \
                Use this tool for task creation, dependency links, notes, and task views.",
            "parameters": {
                "type": "object",
                "properties": {
                    "op": {
                        "type": "string",
                        "enum": ops,
                        "description": "Operation to execute on the task graph."
                    },
                    "id": {"type": "string", "description": "Task ID for get/note_append/close/delete."},
                    "title": {"type": "string", "description": "Title for create."},
                    "description": {"type": "string", "description": "Description for create."},
                    "client_id": {
                        "type": "string",
                        "description": "Optional idempotency key for create. \
                            If reused, returns the existing task instead of creating duplicates."
                    },
                    "view": {
                        "type": "string",
                        "enum": views,
                        "description": "List filter for list operation. Defaults to open."
                    },
                    "include_full": {
                        "type": "boolean",
                        "description": "For list: include full notes/deps instead of compact rows."
                    },
                    "limit": {"type": "integer", "description": "Optional list page size."},
                    "offset": {"type": "integer", "description": "Optional list offset."},
                    "note": {"type": "string", "description": "Note text for note_append."},
                    "blocker_id": {"type": "string", "description": "Dependency blocker task id."},
                    "blocked_id": {"type": "string", "description": "Dependency blocked task id."},
                    "reason": {"type": "string", "description": "Reason for close."},
                    "hard": {"type": "boolean", "description": "For delete: hard delete when true."}
                },
                "required": ["op"]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> GraphStore {
        GraphStore::new(dir.path().join("tasks.json"))
    }

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!(matches!(
            "update".parse::<Operation>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn list_query_applies_defaults() {
        let request = ToolRequest::new(Operation::List);
        let query = request.list_query().unwrap();
        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn list_query_clamps_negative_offset_and_rejects_negative_limit() {
        let mut request = ToolRequest::new(Operation::List);
        request.offset = Some(-3);
        assert_eq!(request.list_query().unwrap().offset, 0);

        request.limit = Some(-1);
        assert!(matches!(
            request.list_query(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_op_is_invalid_argument() {
        let err = ToolRequest::from_value(json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("'op'")));
    }

    #[test]
    fn wrong_argument_type_is_invalid_argument() {
        let err = ToolRequest::from_value(json!({"op": "list", "limit": "ten"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn execute_requires_op_specific_arguments() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = execute(&store, &ToolRequest::new(Operation::Create)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("title")));

        let mut request = ToolRequest::new(Operation::DepAdd);
        request.blocker_id = Some("task-1".into());
        let err = execute(&store, &request).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("blocked_id")));
    }

    #[test]
    fn create_defaults_description_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut request = ToolRequest::new(Operation::Create);
        request.title = Some("Only a title".into());

        let value = execute(&store, &request).unwrap();
        assert_eq!(value["created"], json!(true));
        assert_eq!(value["task"]["description"], json!(""));
        assert_eq!(value["task"]["ready"], json!(true));
    }

    #[test]
    fn invoke_wraps_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let ok = invoke(&store, json!({"op": "create", "title": "Seed"}));
        assert!(ok.ok);
        assert_eq!(ok.op.as_deref(), Some("create"));
        assert_eq!(ok.result.as_ref().unwrap()["task"]["id"], json!("task-1"));

        let missing = invoke(&store, json!({"op": "get", "id": "task-9"}));
        assert!(!missing.ok);
        let body = missing.to_value();
        assert_eq!(body["error"]["kind"], json!("not_found"));
        assert!(body.get("result").is_none());

        let bad_view = invoke(&store, json!({"op": "list", "view": "blocked"}));
        assert_eq!(bad_view.to_value()["error"]["kind"], json!("invalid_argument"));
    }

    #[test]
    fn invoke_json_reports_unparseable_arguments() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let response = invoke_json(&store, "{not json");
        assert!(!response.ok);
        assert!(response.op.is_none());
        assert_eq!(response.to_value()["error"]["kind"], json!("invalid_argument"));
    }

    #[test]
    fn tool_definition_lists_every_op_and_view() {
        let tool = tool_definition();
        assert_eq!(tool["function"]["name"], json!("tasks"));
        let props = &tool["function"]["parameters"]["properties"];
        let ops = props["op"]["enum"].as_array().unwrap();
        assert_eq!(ops.len(), Operation::ALL.len());
        assert!(ops.contains(&json!("note_append")));
        let views = props["view"]["enum"].as_array().unwrap();
        assert!(views.contains(&json!("ready")));
        assert_eq!(tool["function"]["parameters"]["required"], json!(["op"]));
    }
}
