use std::path::PathBuf;

use serde_json::Value;
use taskgraph::error::{exit_codes, Error, JsonError};

#[test]
fn exit_code_user_error() {
    for err in [
        Error::NotFound("task-1".to_string()),
        Error::InvalidArgument("bad input".to_string()),
        Error::InvalidConfig("bad config".to_string()),
    ] {
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR, "{err}");
    }
}

#[test]
fn exit_code_operation_failed() {
    let corrupt = Error::StorageCorruption {
        path: PathBuf::from("/tmp/tasks.json"),
        message: "expected value".to_string(),
    };
    assert_eq!(corrupt.exit_code(), exit_codes::OPERATION_FAILED);

    let lock = Error::LockFailed(PathBuf::from("/tmp/tasks.json.lock"));
    assert_eq!(lock.exit_code(), exit_codes::OPERATION_FAILED);

    let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert_eq!(io.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn kinds_are_stable_identifiers() {
    assert_eq!(Error::NotFound("task-1".into()).kind(), "not_found");
    assert_eq!(Error::InvalidArgument("x".into()).kind(), "invalid_argument");
    assert_eq!(
        Error::StorageCorruption {
            path: PathBuf::from("a"),
            message: "b".into()
        }
        .kind(),
        "storage_corruption"
    );
    assert_eq!(Error::LockFailed(PathBuf::from("a")).kind(), "lock_failed");
}

#[test]
fn details_include_corruption_fields() {
    let err = Error::StorageCorruption {
        path: PathBuf::from("runs/a/tasks.json"),
        message: "trailing characters".to_string(),
    };
    let details = err.details().expect("details");
    assert_eq!(details["path"], Value::String("runs/a/tasks.json".to_string()));
    assert_eq!(
        details["message"],
        Value::String("trailing characters".to_string())
    );
}

#[test]
fn json_error_carries_kind_code_and_message() {
    let err = Error::NotFound("task-4".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.kind, "not_found");
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.message, "Unknown task id: task-4");

    let value = serde_json::to_value(&json).expect("serialize");
    assert_eq!(value["details"]["id"], Value::String("task-4".to_string()));
}

#[test]
fn json_error_omits_empty_details() {
    let err = Error::InvalidArgument("A task cannot depend on itself".to_string());
    let value = serde_json::to_value(JsonError::from(&err)).expect("serialize");
    assert!(value.get("details").is_none());
}
