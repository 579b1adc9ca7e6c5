//! Edit conflict detection and resolution.
//!
//! A conflict exists when somebody other than the acting user holds a live
//! edit lease on the task. The caller then picks a resolution instead of
//! opening the edit form directly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::task::{Task, TaskPatch};
use crate::user::User;

/// True iff another user is currently editing `task`.
pub fn has_conflict(task: &Task, acting_user: &User) -> bool {
    has_conflict_at(task, acting_user, Utc::now())
}

pub fn has_conflict_at(task: &Task, acting_user: &User, now: DateTime<Utc>) -> bool {
    task.editing_by_at(now)
        .is_some_and(|holder| holder.id != acting_user.id)
}

// =============================================================================
// Resolution
// =============================================================================

/// Combines the stored task with the data a user submitted over a conflict.
pub trait FieldReconciler: fmt::Debug + Send + Sync {
    fn reconcile(&self, stored: &Task, submitted: TaskPatch) -> TaskPatch;
}

/// Keeps the submitted data as-is. No field-level reconciliation happens;
/// the conflict marker is simply dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepSubmitted;

impl FieldReconciler for KeepSubmitted {
    fn reconcile(&self, _stored: &Task, submitted: TaskPatch) -> TaskPatch {
        submitted
    }
}

/// How to proceed when an edit collides with another user's edit lease
#[derive(Debug)]
pub enum ConflictResolution {
    /// Discard the other editor's marker and apply the submitted data
    Overwrite,
    /// Run the submitted data through a reconciler, then apply it
    Merge(Box<dyn FieldReconciler>),
}

impl ConflictResolution {
    /// Merge with the default (pass-through) reconciler
    pub fn merge() -> Self {
        ConflictResolution::Merge(Box::new(KeepSubmitted))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConflictResolution::Overwrite => "overwrite",
            ConflictResolution::Merge(_) => "merge",
        }
    }

    /// Clear the conflicting marker on `task` and return the patch to apply.
    pub fn resolve(&self, task: &mut Task, submitted: TaskPatch) -> TaskPatch {
        task.editing = None;
        match self {
            ConflictResolution::Overwrite => submitted,
            ConflictResolution::Merge(reconciler) => reconciler.reconcile(task, submitted),
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConflictResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(ConflictResolution::Overwrite),
            "merge" => Ok(ConflictResolution::merge()),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid conflict resolution '{}'. Expected: merge, overwrite",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::EditLease;
    use crate::task::TaskDraft;
    use crate::user::mock_users;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn task_edited_by(user: Option<&User>) -> Task {
        let mut task = Task::from_draft(TaskDraft::new("Design API"), t0());
        task.editing = user.map(|u| EditLease::new(u.clone(), Duration::minutes(5), t0()));
        task
    }

    #[test]
    fn conflict_only_for_other_editor() {
        let users = mock_users();
        let alice = &users[0];
        let bob = &users[1];

        assert!(!has_conflict_at(&task_edited_by(None), alice, t0()));
        assert!(!has_conflict_at(&task_edited_by(Some(alice)), alice, t0()));
        assert!(has_conflict_at(&task_edited_by(Some(bob)), alice, t0()));
    }

    #[test]
    fn expired_editor_is_no_conflict() {
        let users = mock_users();
        let task = task_edited_by(Some(&users[1]));
        assert!(!has_conflict_at(&task, &users[0], t0() + Duration::minutes(10)));
    }

    #[test]
    fn both_resolutions_clear_marker() {
        let users = mock_users();
        let submitted = TaskPatch {
            title: Some("Design API v2".to_string()),
            ..TaskPatch::default()
        };

        for resolution in [ConflictResolution::Overwrite, ConflictResolution::merge()] {
            let mut task = task_edited_by(Some(&users[1]));
            let patch = resolution.resolve(&mut task, submitted.clone());
            assert!(task.editing.is_none(), "{resolution} left the marker");
            assert_eq!(patch, submitted);
        }
    }

    #[test]
    fn custom_reconciler_is_used() {
        #[derive(Debug)]
        struct KeepStoredTitle;
        impl FieldReconciler for KeepStoredTitle {
            fn reconcile(&self, _stored: &Task, mut submitted: TaskPatch) -> TaskPatch {
                submitted.title = None;
                submitted
            }
        }

        let users = mock_users();
        let mut task = task_edited_by(Some(&users[1]));
        let resolution = ConflictResolution::Merge(Box::new(KeepStoredTitle));
        let patch = resolution.resolve(
            &mut task,
            TaskPatch {
                title: Some("Other".to_string()),
                ..TaskPatch::default()
            },
        );
        assert!(patch.title.is_none());
    }

    #[test]
    fn parse_resolution() {
        assert_eq!("merge".parse::<ConflictResolution>().unwrap().name(), "merge");
        assert_eq!("Overwrite".parse::<ConflictResolution>().unwrap().name(), "overwrite");
        assert!("rebase".parse::<ConflictResolution>().is_err());
    }
}
