//! Configuration loading and management
//!
//! Handles parsing of `.taskgraph.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::model::ListView;
use crate::paths::PathContext;

/// Configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".taskgraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store location and locking
    #[serde(default)]
    pub store: StoreConfig,

    /// Defaults for `list`
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Explicit store file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Root for per-instance stores (`<output_dir>/<instance_id>/tasks.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// How long to wait for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            output_dir: None,
            instance_id: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default)]
    pub default_view: ListView,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,
}

impl Config {
    /// Load configuration from a `.taskgraph.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Path resolution inputs described by this config
    pub fn path_context(&self) -> PathContext {
        PathContext {
            tasks_graph_path: self.store.path.clone(),
            output_dir: self.store.output_dir.clone(),
            instance_id: self.store.instance_id.clone(),
            env_cwd: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.store.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.list.default_limit == Some(0) {
            return Err(Error::InvalidConfig(
                "list.default_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.store.path.is_none());
        assert!(cfg.store.output_dir.is_none());
        assert!(cfg.store.instance_id.is_none());
        assert_eq!(cfg.store.lock_timeout_ms, 5000);
        assert_eq!(cfg.list.default_view, ListView::Open);
        assert!(cfg.list.default_limit.is_none());
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[store]
output_dir = "runs"
instance_id = "django-1234"
lock_timeout_ms = 250

[list]
default_view = "ready"
default_limit = 20
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.store.output_dir, Some(PathBuf::from("runs")));
        assert_eq!(cfg.store.instance_id.as_deref(), Some("django-1234"));
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        assert_eq!(cfg.list.default_view, ListView::Ready);
        assert_eq!(cfg.list.default_limit, Some(20));

        let context = cfg.path_context();
        assert_eq!(context.instance_id.as_deref(), Some("django-1234"));
        assert!(context.tasks_graph_path.is_none());
    }

    #[test]
    fn load_rejects_zero_lock_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[store]\nlock_timeout_ms = 0\n").expect("write config");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_rejects_unknown_view() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[list]\ndefault_view = \"blocked\"\n").expect("write config");

        assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn invalid_config_in_dir_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "[store]\nlock_timeout_ms = 0\n")
            .expect("write config");

        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.store.lock_timeout_ms, 5000);
    }
}
