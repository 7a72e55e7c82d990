//! taskgraph - Persistent Task Dependency Graph
//!
//! A small, file-backed store of tasks for LLM agents: titles, notes,
//! blocker edges and a derived "ready" flag, kept in one JSON document so
//! several processes can share it.
//!
//! # Core Concepts
//!
//! - **Tasks**: records with ids `task-<n>` allocated from a monotonic counter
//! - **Dependencies**: reciprocal `blockers`/`blocked` edges
//! - **Readiness**: an open task whose blockers have all left `open`
//! - **Idempotent creation**: a caller-supplied `client_id` maps to one task
//!
//! # Module Organization
//!
//! - `model`: task records and operation result shapes
//! - `graph`: the in-memory aggregate and its invariants
//! - `store`: load/mutate/save cycles against the backing file
//! - `lock`: advisory locking and atomic file replacement
//! - `paths`: store file location resolution
//! - `tool`: the JSON invocation contract for agent tool layers
//! - `config`: `.taskgraph.toml` loading
//! - `cli` / `output`: the `taskgraph` command-line front end
//! - `error`: error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod output;
pub mod paths;
pub mod store;
pub mod tool;

pub use error::{Error, Result};
pub use graph::TaskGraph;
pub use store::GraphStore;
