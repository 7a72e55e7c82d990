use std::fs;
use std::path::{Path, PathBuf};

use taskgraph::config::{Config, CONFIG_FILE};
use taskgraph::model::ListView;
use taskgraph::paths::resolve_store_path;

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_from_dir(dir.path());

    assert!(config.store.path.is_none());
    assert_eq!(config.store.lock_timeout_ms, 5000);
    assert_eq!(config.list.default_view, ListView::Open);
    assert!(config.list.default_limit.is_none());
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let toml = r#"
[store]
output_dir = "/srv/runs"
instance_id = "astropy-42"
lock_timeout_ms = 1500

[list]
default_view = "closed"
"#;
    fs::write(dir.path().join(CONFIG_FILE), toml)?;

    let config = Config::load_from_dir(dir.path());
    assert_eq!(config.store.lock_timeout_ms, 1500);
    assert_eq!(config.list.default_view, ListView::Closed);

    let path = resolve_store_path(&config.path_context(), Path::new("/work"));
    assert_eq!(path, PathBuf::from("/srv/runs/astropy-42/tasks.json"));
    Ok(())
}

#[test]
fn config_with_only_path_resolves_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("custom.toml");
    fs::write(&config_path, "[store]\npath = \"/data/graph.json\"\n")?;

    let config = Config::load(&config_path)?;
    let path = resolve_store_path(&config.path_context(), Path::new("/work"));
    assert_eq!(path, PathBuf::from("/data/graph.json"));
    Ok(())
}

#[test]
fn malformed_config_falls_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(CONFIG_FILE), "[store\npath = ")?;

    let config = Config::load_from_dir(dir.path());
    assert!(config.store.path.is_none());

    let path = resolve_store_path(&config.path_context(), Path::new("/work"));
    assert_eq!(path, PathBuf::from("/work/.tasks.json"));
    Ok(())
}
