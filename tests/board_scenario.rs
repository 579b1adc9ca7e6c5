mod support;

use taskboard::board::Board;
use taskboard::task::{TaskDraft, TaskPatch, TaskStatus};
use taskboard::user::{mock_users, User};
use taskboard::Error;

use support::{alice, bob};

#[test]
fn create_assign_move_logs_three_actions() {
    let users = vec![alice(), bob()];
    let actor = alice();
    let mut board = Board::new(users);

    let task = board
        .create_task(&actor, TaskDraft::new("Design API"))
        .expect("create");
    let assignee = board.smart_assign(&actor, &task.id).expect("assignee");
    assert_eq!(assignee.name, "Alice Johnson");
    assert!(board.move_task(&actor, &task.id, TaskStatus::InProgress));

    let stored = board.find(&task.id).expect("task");
    assert_eq!(stored.status, TaskStatus::InProgress);
    assert_eq!(stored.assigned_user.as_ref().map(|u| u.id.as_str()), Some("1"));

    let texts: Vec<String> = board.actions().into_iter().map(|a| a.action).collect();
    assert_eq!(
        texts,
        vec![
            "created task \"Design API\"".to_string(),
            "smart assigned task \"Design API\" to Alice Johnson".to_string(),
            "moved task \"Design API\" to In Progress".to_string(),
        ]
    );
    assert!(board.actions().iter().all(|a| a.user.id == actor.id));
}

#[test]
fn column_names_are_rejected_as_titles() {
    let mut board = Board::new(mock_users());
    let actor = alice();

    for title in ["todo", "TODO", "  Done ", "in progress", ""] {
        let err = board.create_task(&actor, TaskDraft::new(title)).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "title"),
            other => panic!("unexpected error for {title:?}: {other}"),
        }
    }
    assert!(board.create_task(&actor, TaskDraft::new("Ship release")).is_ok());
}

#[test]
fn deleting_unknown_id_changes_nothing() {
    let mut board = Board::new(mock_users());
    let actor = alice();
    board
        .create_task(&actor, TaskDraft::new("Keep me"))
        .expect("create");

    assert!(board.delete_task(&actor, "01nonexistent").is_none());
    assert_eq!(board.tasks().len(), 1);
    assert_eq!(board.action_log().len(), 1);
}

#[test]
fn every_mutation_appends_exactly_one_action() {
    let users = mock_users();
    let actor: User = users[2].clone();
    let mut board = Board::new(users);

    let task = board
        .create_task(&actor, TaskDraft::new("Review PR"))
        .expect("create");
    board
        .update_task(
            &actor,
            &task.id,
            TaskPatch {
                description: Some("look at tests too".to_string()),
                ..TaskPatch::default()
            },
        )
        .expect("update")
        .expect("present");
    board.move_task(&actor, &task.id, TaskStatus::Done);
    board.smart_assign(&actor, &task.id);
    board.delete_task(&actor, &task.id);

    assert_eq!(board.action_log().len(), 5);
    assert!(board.tasks().is_empty());
    let last = board.action_log().last().expect("last");
    assert_eq!(last.action, "deleted task \"Review PR\"");
    assert_eq!(last.user.name, "Charlie Brown");
}

#[test]
fn smart_assign_skips_done_work() {
    let users = vec![alice(), bob()];
    let actor = alice();
    let mut board = Board::new(users);

    let first = board.create_task(&actor, TaskDraft::new("One")).expect("create");
    board.smart_assign(&actor, &first.id);
    board.move_task(&actor, &first.id, TaskStatus::Done);

    // Alice's only task is Done, so she is least loaded again
    let second = board.create_task(&actor, TaskDraft::new("Two")).expect("create");
    assert_eq!(board.smart_assign(&actor, &second.id).expect("user").id, "1");

    let third = board.create_task(&actor, TaskDraft::new("Three")).expect("create");
    assert_eq!(board.smart_assign(&actor, &third.id).expect("user").id, "2");
}
