#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use taskgraph::GraphStore;
use tempfile::TempDir;

/// Scratch directory holding one store file
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn store(&self) -> GraphStore {
        GraphStore::new(self.store_path())
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".taskgraph.toml", contents)
    }

    pub fn read_store(&self) -> String {
        fs::read_to_string(self.store_path()).expect("read store file")
    }

    pub fn read_store_json(&self) -> Value {
        serde_json::from_str(&self.read_store()).expect("store is valid json")
    }

    /// `taskgraph` running in this directory against `tasks.json`
    pub fn cmd(&self) -> Command {
        let mut cmd = taskgraph_cmd();
        cmd.current_dir(self.path());
        cmd.arg("--store").arg(self.store_path());
        cmd
    }

    /// `taskgraph` running in this directory with no location flags
    pub fn bare_cmd(&self) -> Command {
        let mut cmd = taskgraph_cmd();
        cmd.current_dir(self.path());
        cmd
    }
}

pub fn taskgraph_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskgraph").expect("binary");
    cmd.env_remove("TASKGRAPH_STORE")
        .env_remove("TASKGRAPH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

pub fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}
