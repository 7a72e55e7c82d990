//! Store file location.
//!
//! Resolution order:
//! 1. an explicit store path,
//! 2. `<output_dir>/<instance_id>/tasks.json` when both are set,
//! 3. `<working dir>/.tasks.json`, where the configured environment working
//!    directory wins over the process one.
//!
//! Empty values count as unset. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name used under the working directory fallback
pub const DEFAULT_STORE_FILE: &str = ".tasks.json";

/// File name used under `<output_dir>/<instance_id>/`
pub const INSTANCE_STORE_FILE: &str = "tasks.json";

/// Inputs to store path resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathContext {
    /// Explicit store file, used verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_graph_path: Option<PathBuf>,
    /// Root for per-instance run output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Working directory of the execution environment, if it has its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_cwd: Option<PathBuf>,
}

fn non_empty_path(value: &Option<PathBuf>) -> Option<&Path> {
    value
        .as_deref()
        .filter(|path| !path.as_os_str().is_empty())
}

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Decide where the store file lives
pub fn resolve_store_path(context: &PathContext, process_cwd: &Path) -> PathBuf {
    if let Some(custom) = non_empty_path(&context.tasks_graph_path) {
        return custom.to_path_buf();
    }

    if let (Some(output_dir), Some(instance_id)) = (
        non_empty_path(&context.output_dir),
        non_empty_str(&context.instance_id),
    ) {
        return output_dir.join(instance_id).join(INSTANCE_STORE_FILE);
    }

    let base = non_empty_path(&context.env_cwd).unwrap_or(process_cwd);
    base.join(DEFAULT_STORE_FILE)
}
