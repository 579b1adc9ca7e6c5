//! Activity feed for the board
//!
//! A bounded, append-only log of human-readable action records. Only the most
//! recent entries are kept; appending past capacity evicts the oldest.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// Number of actions retained when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 20;

/// Activity log record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub id: Uuid,
    /// User as they were when the action was logged
    pub user: User,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Action {
    pub fn new(user: User, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            action: action.into(),
            timestamp: Utc::now(),
            task_id: None,
            details: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Bounded FIFO of actions, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLog {
    capacity: usize,
    entries: VecDeque<Action>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActionLog {
    /// Create an empty log. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Rehydrate a log, keeping only the newest `capacity` entries
    pub fn from_vec(capacity: usize, actions: Vec<Action>) -> Self {
        let mut log = Self::new(capacity);
        for action in actions {
            log.append(action);
        }
        log
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an action, evicting the oldest entries beyond capacity.
    /// Returns the evicted entry, if any.
    pub fn append(&mut self, action: Action) -> Option<Action> {
        self.entries.push_back(action);
        if self.entries.len() > self.capacity {
            return self.entries.pop_front();
        }
        None
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Action> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Action> {
        self.entries.back()
    }

    /// Entries newest first, filtered and optionally limited
    pub fn recent(&self, filter: &ActionFilter, limit: Option<usize>) -> Vec<&Action> {
        let matching = self.entries.iter().rev().filter(|action| filter.matches(action));
        match limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    pub fn to_vec(&self) -> Vec<Action> {
        self.iter().cloned().collect()
    }
}

/// Filter for selecting activity entries
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    /// Matches user id, email, or display name
    pub user: Option<String>,
    pub task_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl ActionFilter {
    pub fn matches(&self, action: &Action) -> bool {
        if let Some(user) = &self.user {
            let user = user.trim();
            if action.user.id != user
                && !action.user.email.eq_ignore_ascii_case(user)
                && !action.user.name.eq_ignore_ascii_case(user)
            {
                return false;
            }
        }

        if let Some(task_id) = &self.task_id {
            if action.task_id.as_deref() != Some(task_id.as_str()) {
                return false;
            }
        }

        if let Some(since) = &self.since {
            if &action.timestamp < since {
                return false;
            }
        }

        true
    }
}

/// Format a single action for human-readable output
pub fn format_action(action: &Action) -> String {
    let ts = action.timestamp.format("%Y-%m-%d %H:%M:%S");
    let mut line = format!("{ts} {} {}", action.user.name, action.action);
    if let Some(details) = &action.details {
        line.push_str(&format!(" ({details})"));
    }
    line
}
