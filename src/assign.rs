//! Smart assignment policy.
//!
//! Picks the user carrying the fewest active (not Done) tasks. Ties go to the
//! user listed first.

use serde::Serialize;

use crate::task::Task;
use crate::user::User;

/// Active task count for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload<'a> {
    pub user: &'a User,
    pub active_tasks: usize,
}

/// Number of non-Done tasks assigned to `user`
pub fn active_count(user: &User, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|task| task.status.is_active() && task.is_assigned_to(user))
        .count()
}

/// Per-user active counts, in input order
pub fn workload<'a>(users: &'a [User], tasks: &[Task]) -> Vec<Workload<'a>> {
    users
        .iter()
        .map(|user| Workload {
            user,
            active_tasks: active_count(user, tasks),
        })
        .collect()
}

/// Choose an assignee. `None` only when `users` is empty.
pub fn assign<'a>(users: &'a [User], tasks: &[Task]) -> Option<&'a User> {
    let mut best: Option<Workload<'a>> = None;
    for candidate in workload(users, tasks) {
        // strict `<` keeps the earliest user on ties
        let better = best
            .as_ref()
            .map_or(true, |current| candidate.active_tasks < current.active_tasks);
        if better {
            best = Some(candidate);
        }
    }
    best.map(|entry| entry.user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskDraft, TaskStatus};
    use crate::user::mock_users;
    use chrono::Utc;

    fn assigned(user: &User, status: TaskStatus) -> Task {
        Task::from_draft(
            TaskDraft::new("work")
                .status(status)
                .assigned_user(Some(user.clone())),
            Utc::now(),
        )
    }

    #[test]
    fn empty_users_yield_none() {
        assert!(assign(&[], &[]).is_none());
        let users = mock_users();
        let tasks = vec![assigned(&users[0], TaskStatus::Todo)];
        assert!(assign(&[], &tasks).is_none());
    }

    #[test]
    fn ties_go_to_first_listed() {
        let users = mock_users();
        assert_eq!(assign(&users, &[]).unwrap().id, "1");

        let reversed: Vec<User> = users.iter().rev().cloned().collect();
        assert_eq!(assign(&reversed, &[]).unwrap().id, "4");
    }

    #[test]
    fn picks_least_loaded() {
        let users = mock_users();
        let tasks = vec![
            assigned(&users[0], TaskStatus::Todo),
            assigned(&users[1], TaskStatus::InProgress),
            assigned(&users[2], TaskStatus::Todo),
            assigned(&users[0], TaskStatus::Todo),
        ];
        assert_eq!(assign(&users, &tasks).unwrap().id, "4");
        assert_eq!(assign(&users[..3], &tasks).unwrap().id, "2");
    }

    #[test]
    fn done_tasks_do_not_count() {
        let users = mock_users();
        let pair = &users[..2];
        let tasks = vec![
            assigned(&users[0], TaskStatus::Done),
            assigned(&users[0], TaskStatus::Done),
            assigned(&users[1], TaskStatus::Todo),
        ];
        assert_eq!(assign(pair, &tasks).unwrap().id, "1");

        let loads = workload(pair, &tasks);
        assert_eq!(loads[0].active_tasks, 0);
        assert_eq!(loads[1].active_tasks, 1);
    }

    #[test]
    fn unassigned_tasks_are_ignored() {
        let users = mock_users();
        let tasks = vec![Task::from_draft(TaskDraft::new("loose"), Utc::now())];
        assert_eq!(active_count(&users[0], &tasks), 0);
    }
}
