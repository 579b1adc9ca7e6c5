//! Board controller.
//!
//! The board owns the task store and the activity log and is the only place
//! that writes to both. Every mutating operation changes the store once and
//! appends one action attributed to the acting user.
//!
//! Missing tasks are not errors here: operations on an unknown id do nothing
//! and report that through their return value. Only title validation fails
//! loudly.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::activity::{Action, ActionLog};
use crate::assign;
use crate::config::Config;
use crate::conflict::{self, ConflictResolution};
use crate::error::Result;
use crate::lease;
use crate::task::{validate_title, Task, TaskDraft, TaskPatch, TaskStatus, TaskStore};
use crate::user::User;

/// Lease length used when no config is supplied
const DEFAULT_LEASE_TTL_MINUTES: i64 = 5;

/// Outcome of trying to open a task for editing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditEntry {
    /// The caller now holds the edit lease
    Direct { expires_at: DateTime<Utc> },
    /// Someone else holds it; a resolution must be chosen
    Conflict { holder: User },
}

#[derive(Debug, Clone)]
pub struct Board {
    tasks: TaskStore,
    log: ActionLog,
    users: Vec<User>,
    lease_ttl: Duration,
}

impl Board {
    /// Empty board for the given user directory
    pub fn new(users: Vec<User>) -> Self {
        Self::from_parts(users, TaskStore::new(), ActionLog::default())
    }

    pub fn from_parts(users: Vec<User>, tasks: TaskStore, log: ActionLog) -> Self {
        Self {
            tasks,
            log,
            users,
            lease_ttl: Duration::minutes(DEFAULT_LEASE_TTL_MINUTES),
        }
    }

    /// Rehydrate a board from persisted tasks and actions
    pub fn from_config(
        config: &Config,
        users: Vec<User>,
        tasks: Vec<Task>,
        actions: Vec<Action>,
    ) -> Result<Self> {
        let log = ActionLog::from_vec(config.log.capacity, actions);
        let mut board = Self::from_parts(users, TaskStore::from_vec(tasks), log)
            .with_lease_ttl(config.editing.lease_ttl()?);
        board.sweep_expired_leases(Utc::now());
        Ok(board)
    }

    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }

    /// Replace tasks and actions with a newer persisted copy, keeping the
    /// user directory, log capacity and lease TTL.
    pub fn reload(&mut self, tasks: Vec<Task>, actions: Vec<Action>) {
        self.tasks = TaskStore::from_vec(tasks);
        self.log = ActionLog::from_vec(self.log.capacity(), actions);
        self.sweep_expired_leases(Utc::now());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tasks(&self) -> &[Task] {
        self.tasks.all()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.find(id)
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.by_status(status)
    }

    pub fn resolve_task_id(&self, input: &str) -> Result<Option<String>> {
        self.tasks.resolve_id(input)
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    pub fn actions(&self) -> Vec<Action> {
        self.log.to_vec()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn into_parts(self) -> (Vec<Task>, Vec<Action>) {
        (self.tasks.into_vec(), self.log.to_vec())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Validate and add a new task.
    pub fn create_task(&mut self, actor: &User, draft: TaskDraft) -> Result<Task> {
        validate_title(&draft.title)?;

        let task = Task::from_draft(draft, Utc::now());
        tracing::debug!(task_id = %task.id, actor = %actor.id, "create task");
        self.tasks.push(task.clone());
        self.record(
            actor,
            format!("created task \"{}\"", task.title),
            Some(&task.id),
            None,
        );
        Ok(task)
    }

    /// Merge `patch` into the task and replace it.
    ///
    /// Returns `Ok(None)` when the task does not exist. The actor's own edit
    /// lease is released since the edit is finished.
    pub fn update_task(&mut self, actor: &User, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(existing) = self.tasks.find(id) else {
            tracing::debug!(task_id = id, "update ignored: no such task");
            return Ok(None);
        };

        let mut updated = existing.clone();
        patch.apply_to(&mut updated);
        validate_title(&updated.title)?;
        lease::release(&mut updated.editing, actor);

        Ok(Some(self.commit_update(actor, updated, None)))
    }

    /// Remove a task. Returns the removed record, or `None` if it was unknown.
    pub fn delete_task(&mut self, actor: &User, id: &str) -> Option<Task> {
        let removed = self.tasks.remove(id)?;
        tracing::debug!(task_id = %removed.id, actor = %actor.id, "delete task");
        self.record(
            actor,
            format!("deleted task \"{}\"", removed.title),
            Some(&removed.id),
            None,
        );
        Some(removed)
    }

    /// Move a task to another column. Returns whether anything changed.
    pub fn move_task(&mut self, actor: &User, id: &str, status: TaskStatus) -> bool {
        let Some(existing) = self.tasks.find(id) else {
            return false;
        };
        if existing.status == status {
            return false;
        }

        let mut moved = existing.clone();
        moved.status = status;
        moved.touch(Utc::now());
        let title = moved.title.clone();
        let task_id = moved.id.clone();
        tracing::debug!(task_id = %task_id, %status, actor = %actor.id, "move task");
        self.tasks.replace(moved);
        self.record(
            actor,
            format!("moved task \"{title}\" to {status}"),
            Some(&task_id),
            None,
        );
        true
    }

    /// Assign the task to the least-loaded user. Returns the chosen user, or
    /// `None` when the task is unknown or there is nobody to assign.
    pub fn smart_assign(&mut self, actor: &User, id: &str) -> Option<User> {
        let existing = self.tasks.find(id)?;
        let chosen = assign::assign(&self.users, self.tasks.all())?.clone();

        let mut assigned = existing.clone();
        assigned.assigned_user = Some(chosen.clone());
        assigned.touch(Utc::now());
        let title = assigned.title.clone();
        tracing::debug!(task_id = id, assignee = %chosen.id, "smart assign");
        self.tasks.replace(assigned);
        self.record(
            actor,
            format!("smart assigned task \"{title}\" to {}", chosen.name),
            Some(id),
            None,
        );
        Some(chosen)
    }

    /// Append an arbitrary action to the activity log.
    pub fn log_action(&mut self, action: Action) {
        if let Some(evicted) = self.log.append(action) {
            tracing::trace!(action_id = %evicted.id, "evicted oldest action");
        }
    }

    /// Whole-record replace coming from outside the controller (peer
    /// activity). Does not log; the producer logs its own action.
    pub fn apply_remote(&mut self, task: Task) -> bool {
        self.tasks.replace(task).is_some()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Open a task for editing.
    ///
    /// Returns `Ok(None)` for an unknown task, `Conflict` when another user
    /// holds a live lease, and otherwise acquires (or renews) the caller's
    /// lease.
    pub fn begin_edit(&mut self, user: &User, id: &str) -> Result<Option<EditEntry>> {
        let now = Utc::now();
        let ttl = self.lease_ttl;
        let Some(task) = self.tasks.find_mut(id) else {
            return Ok(None);
        };

        if conflict::has_conflict_at(task, user, now) {
            let holder = task.editing_by_at(now).cloned();
            return Ok(holder.map(|holder| EditEntry::Conflict { holder }));
        }

        let acquired = lease::acquire_at(&mut task.editing, user, ttl, now)?;
        tracing::debug!(task_id = id, user = %user.id, "edit lease acquired");
        Ok(Some(EditEntry::Direct {
            expires_at: acquired.expires_at,
        }))
    }

    /// Drop edit leases that expired before `now`. Returns how many were
    /// dropped.
    pub fn sweep_expired_leases(&mut self, now: DateTime<Utc>) -> usize {
        let mut swept = 0;
        for id in self.task_ids() {
            if let Some(task) = self.tasks.find_mut(&id) {
                if let Some(lease) = lease::expire_stale_at(&mut task.editing, now) {
                    tracing::debug!(task_id = %id, holder = %lease.holder.id, "edit lease expired");
                    swept += 1;
                }
            }
        }
        swept
    }

    fn task_ids(&self) -> Vec<String> {
        self.tasks.all().iter().map(|task| task.id.clone()).collect()
    }

    /// Give up the caller's edit lease without saving. Returns whether a
    /// lease was released.
    pub fn end_edit(&mut self, user: &User, id: &str) -> bool {
        self.tasks
            .find_mut(id)
            .is_some_and(|task| lease::release(&mut task.editing, user))
    }

    /// Apply an edit over another user's lease using the chosen resolution.
    pub fn resolve_conflict(
        &mut self,
        actor: &User,
        id: &str,
        resolution: &ConflictResolution,
        patch: TaskPatch,
    ) -> Result<Option<Task>> {
        let Some(existing) = self.tasks.find(id) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        let displaced = updated
            .editing_by()
            .filter(|holder| holder.id != actor.id)
            .map(|holder| holder.name.clone());
        let patch = resolution.resolve(&mut updated, patch);
        patch.apply_to(&mut updated);
        validate_title(&updated.title)?;

        let details = displaced.map(|name| format!("{resolution} over edit by {name}"));
        Ok(Some(self.commit_update(actor, updated, details)))
    }

    fn commit_update(&mut self, actor: &User, mut updated: Task, details: Option<String>) -> Task {
        updated.touch(Utc::now());
        tracing::debug!(task_id = %updated.id, actor = %actor.id, "update task");
        self.tasks.replace(updated.clone());
        self.record(
            actor,
            format!("updated task \"{}\"", updated.title),
            Some(&updated.id),
            details,
        );
        updated
    }

    fn record(&mut self, actor: &User, text: String, task_id: Option<&str>, details: Option<String>) {
        let mut action = Action::new(actor.clone(), text);
        if let Some(task_id) = task_id {
            action = action.with_task(task_id);
        }
        if let Some(details) = details {
            action = action.with_details(details);
        }
        self.log_action(action);
    }
}
