//! Storage layer for taskboard
//!
//! Board state is persisted as a small key-value store: one JSON document per
//! key. The keys match the ones the browser build of the board used, so an
//! exported local-storage dump can be dropped into a data directory as-is.
//!
//! # Directory Structure
//!
//! ```text
//! <data-dir>/
//!   taskboard.toml                    # Optional configuration
//!   collaborative_tasks.json          # Task list, board order
//!   collaborative_actions.json        # Activity log, oldest first
//!   collaborative_todo_auth.json      # Login state
//!   *.json.lock                       # Per-key lock files
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use crate::activity::{Action, ActionLog};
use crate::auth::AuthState;
use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;
use crate::user::User;

/// Key holding the task list
pub const TASKS_KEY: &str = "collaborative_tasks";
/// Key holding the action log
pub const ACTIONS_KEY: &str = "collaborative_actions";
/// Key holding the auth state
pub const AUTH_KEY: &str = "collaborative_todo_auth";

/// String-keyed store of JSON documents
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// File-backed store
// =============================================================================

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %err, "data directory unusable");
            return Err(Error::StorageUnavailable(dir));
        }
        if !dir.is_dir() {
            return Err(Error::StorageUnavailable(dir));
        }
        Ok(Self { dir })
    }

    /// Path of the document backing `key`
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(bytes) = lock::read_locked(self.key_path(key), DEFAULT_LOCK_TIMEOUT_MS)? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::OperationFailed(format!("Invalid UTF-8 in {key}: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock::write_atomic_locked(self.key_path(key), value.as_bytes(), DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock::remove_locked(self.key_path(key), DEFAULT_LOCK_TIMEOUT_MS)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::OperationFailed("memory store poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// Board persistence
// =============================================================================

/// Typed access to the board's keys over any store
#[derive(Debug, Clone)]
pub struct BoardStorage<S> {
    store: S,
}

impl BoardStorage<FileStore> {
    /// File-backed storage in `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(FileStore::open(dir)?))
    }
}

impl<S: KeyValueStore> BoardStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.store.set(key, &json)
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.read_json(TASKS_KEY)?.unwrap_or_default())
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_json(TASKS_KEY, tasks)
    }

    pub fn load_actions(&self) -> Result<Vec<Action>> {
        Ok(self.read_json(ACTIONS_KEY)?.unwrap_or_default())
    }

    pub fn save_actions(&self, actions: &[Action]) -> Result<()> {
        self.write_json(ACTIONS_KEY, actions)
    }

    /// Persisted login state; logged out when nothing is stored
    pub fn load_auth(&self) -> Result<AuthState> {
        Ok(self.read_json(AUTH_KEY)?.unwrap_or_else(AuthState::logged_out))
    }

    pub fn save_auth(&self, state: &AuthState) -> Result<()> {
        self.write_json(AUTH_KEY, state)
    }

    pub fn clear_auth(&self) -> Result<()> {
        self.store.remove(AUTH_KEY)
    }

    /// Rebuild the board from stored tasks and actions
    pub fn load_board(&self, config: &Config, users: Vec<User>) -> Result<Board> {
        let tasks = self.load_tasks()?;
        let actions = self.load_actions()?;
        tracing::debug!(tasks = tasks.len(), actions = actions.len(), "board loaded");
        Board::from_config(config, users, tasks, actions)
    }

    pub fn save_board(&self, board: &Board) -> Result<()> {
        self.save_tasks(board.tasks())?;
        self.save_actions(&board.actions())
    }

    /// Swap `board`'s tasks and actions for what is stored right now
    pub fn refresh_board(&self, board: &mut Board) -> Result<()> {
        board.reload(self.load_tasks()?, self.load_actions()?);
        Ok(())
    }

    /// Persist a peer move on top of the stored state.
    ///
    /// Only the moved task's status and `updated_at` are written, and the
    /// action is appended to the stored log trimmed to `capacity`. Everything
    /// else stored since the move was generated is left alone. Returns
    /// `false` without writing when the task has been deleted meanwhile.
    pub fn record_peer_move(&self, moved: &Task, action: &Action, capacity: usize) -> Result<bool> {
        let mut tasks = self.load_tasks()?;
        let Some(stored) = tasks.iter_mut().find(|task| task.id == moved.id) else {
            return Ok(false);
        };
        stored.status = moved.status;
        stored.updated_at = moved.updated_at;

        let mut log = ActionLog::from_vec(capacity, self.load_actions()?);
        log.append(action.clone());

        self.save_tasks(&tasks)?;
        self.save_actions(&log.to_vec())?;
        Ok(true)
    }
}
