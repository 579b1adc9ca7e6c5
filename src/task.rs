//! Task model and in-memory task store.
//!
//! Tasks live in an ordered in-memory collection and are edited by replacing
//! the whole record. Persisting the collection is the caller's business (see
//! `storage`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::lease::EditLease;
use crate::user::User;

/// Column names a title may not collide with (compared case-insensitively).
const COLUMN_NAMES: [&str; 3] = ["todo", "in progress", "done"];
const MIN_ID_PREFIX_LEN: usize = 3;

// =============================================================================
// Status and priority
// =============================================================================

/// Workflow column of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in board column order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Done tasks do not count towards a user's workload
    pub fn is_active(&self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "todo" | "to do" => Ok(TaskStatus::Todo),
            "in progress" | "inprogress" | "doing" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid status '{}'. Expected: todo, in-progress, done",
                s
            ))),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "Low"),
            TaskPriority::Medium => write!(f, "Medium"),
            TaskPriority::High => write!(f, "High"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "med" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid priority '{}'. Expected: low, medium, high",
                s
            ))),
        }
    }
}

// =============================================================================
// Task
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_user: Option<User>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing: Option<EditLease>,
}

impl Task {
    /// Build a fresh task from submitted form data
    pub fn from_draft(draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_task_id(),
            title: draft.title,
            description: draft.description,
            assigned_user: draft.assigned_user,
            status: draft.status,
            priority: draft.priority,
            created_at: now,
            updated_at: now,
            editing: None,
        }
    }

    /// Refresh `updated_at`, never moving it before `created_at`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// The user currently editing this task, if their lease is still live
    pub fn editing_by(&self) -> Option<&User> {
        self.editing_by_at(Utc::now())
    }

    pub fn editing_by_at(&self, now: DateTime<Utc>) -> Option<&User> {
        self.editing
            .as_ref()
            .filter(|lease| lease.is_active_at(now))
            .map(|lease| &lease.holder)
    }

    pub fn is_assigned_to(&self, user: &User) -> bool {
        self.assigned_user
            .as_ref()
            .is_some_and(|assigned| assigned.id == user.id)
    }
}

/// Form data for a new task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_user: Option<User>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assigned_user(mut self, user: Option<User>) -> Self {
        self.assigned_user = user;
        self
    }
}

/// Partial update merged into a copy of an existing task.
///
/// `assigned_user: Some(None)` clears the assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_user: Option<Option<User>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_user.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }

    /// Merge this patch into `task`, leaving identity and timestamps alone
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(assigned) = &self.assigned_user {
            task.assigned_user = assigned.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Check a task title: required, and not one of the column names.
pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("title", "Title is required"));
    }
    let lowered = trimmed.to_lowercase();
    if COLUMN_NAMES.contains(&lowered.as_str()) {
        return Err(Error::validation("title", "Title cannot match column names"));
    }
    Ok(())
}

pub fn generate_task_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

// =============================================================================
// Task Store
// =============================================================================

/// Ordered in-memory task collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn from_vec(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Tasks in one column, in store order
    pub fn by_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |task| task.status == status)
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Replace the task with the same id. Returns the previous record, or
    /// `None` (and stores nothing) when no such task exists.
    pub fn replace(&mut self, task: Task) -> Option<Task> {
        let slot = self.find_mut(&task.id)?;
        Some(std::mem::replace(slot, task))
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Resolve a full id or a unique id prefix.
    ///
    /// Returns `Ok(None)` when nothing matches and an error when the prefix is
    /// ambiguous or too short to be useful.
    pub fn resolve_id(&self, input: &str) -> Result<Option<String>> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Some(task) = self.find(&needle) {
            return Ok(Some(task.id.clone()));
        }
        if needle.len() < MIN_ID_PREFIX_LEN {
            return Err(Error::InvalidArgument(format!(
                "task id prefix '{needle}' is too short (min {MIN_ID_PREFIX_LEN} chars)"
            )));
        }

        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.id.starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [task] => Ok(Some(task.id.clone())),
            many => Err(Error::InvalidArgument(format!(
                "task id prefix '{needle}' is ambiguous ({} matches)",
                many.len()
            ))),
        }
    }

    pub fn into_vec(self) -> Vec<Task> {
        self.tasks
    }
}
