//! taskboard - Collaborative Task Board Library
//!
//! This library provides the core of the taskboard CLI: a three-column task
//! board shared by a small team, with an activity feed and simulated
//! teammates.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled work items in Todo, In Progress or Done
//! - **Smart assignment**: hand a task to whoever carries the fewest open tasks
//! - **Edit leases**: expiring claims that flag concurrent edits
//! - **Activity log**: the most recent actions, attributed to their user
//! - **Peer activity**: a timer that plays the rest of the team
//!
//! # Module Organization
//!
//! - `user`: Mock user directory
//! - `task`: Task model, validation and in-memory store
//! - `activity`: Bounded action log
//! - `assign`: Smart assignment policy
//! - `lease`: Edit leases and duration parsing
//! - `conflict`: Edit conflict detection and resolution strategies
//! - `board`: Board controller tying store and log together
//! - `simulation`: Simulated peer activity and its background driver
//! - `auth`: Mock login and session state
//! - `storage`: Key-value persistence of board state
//! - `lock`: File locking and atomic writes
//! - `config`: Configuration loading from `taskboard.toml`
//! - `output`: Human and JSON output envelopes
//! - `cli`: Command-line interface using clap
//! - `error`: Error types and result aliases

pub mod activity;
pub mod assign;
pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod lease;
pub mod lock;
pub mod output;
pub mod simulation;
pub mod storage;
pub mod task;
pub mod user;

pub use board::Board;
pub use error::{Error, Result};
