use taskboard::activity::{Action, ActionFilter, ActionLog, DEFAULT_CAPACITY};
use taskboard::board::Board;
use taskboard::task::{TaskDraft, TaskStatus};
use taskboard::user::mock_users;

#[test]
fn twenty_first_append_evicts_oldest() {
    let users = mock_users();
    let mut log = ActionLog::default();
    for i in 0..DEFAULT_CAPACITY {
        assert!(log
            .append(Action::new(users[0].clone(), format!("action {i}")))
            .is_none());
    }

    let evicted = log
        .append(Action::new(users[1].clone(), "action 20"))
        .expect("evicted");
    assert_eq!(evicted.action, "action 0");
    assert_eq!(log.len(), DEFAULT_CAPACITY);

    let texts: Vec<&str> = log.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(texts.first(), Some(&"action 1"));
    assert_eq!(texts.last(), Some(&"action 20"));
}

#[test]
fn board_log_stays_bounded() {
    let users = mock_users();
    let actor = users[0].clone();
    let mut board = Board::new(users);
    let task = board.create_task(&actor, TaskDraft::new("Churn")).expect("create");

    for i in 0..30 {
        let status = if i % 2 == 0 {
            TaskStatus::Done
        } else {
            TaskStatus::Todo
        };
        assert!(board.move_task(&actor, &task.id, status));
    }

    assert_eq!(board.action_log().len(), DEFAULT_CAPACITY);
    assert!(board
        .actions()
        .iter()
        .all(|action| action.action.starts_with("moved task")));
}

#[test]
fn recent_is_newest_first_and_filterable() {
    let users = mock_users();
    let mut board = Board::new(users.clone());
    let a = board
        .create_task(&users[0], TaskDraft::new("Alpha"))
        .expect("create");
    board
        .create_task(&users[1], TaskDraft::new("Beta"))
        .expect("create");
    board.move_task(&users[0], &a.id, TaskStatus::Done);

    let all = board.action_log().recent(&ActionFilter::default(), Some(2));
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].action, "moved task \"Alpha\" to Done");

    let by_bob = ActionFilter {
        user: Some("bob@example.com".to_string()),
        ..ActionFilter::default()
    };
    let bob_actions = board.action_log().recent(&by_bob, None);
    assert_eq!(bob_actions.len(), 1);
    assert_eq!(bob_actions[0].action, "created task \"Beta\"");

    let on_alpha = ActionFilter {
        task_id: Some(a.id.clone()),
        ..ActionFilter::default()
    };
    assert_eq!(board.action_log().recent(&on_alpha, None).len(), 2);
}
