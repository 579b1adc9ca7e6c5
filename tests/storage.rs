mod support;

use std::fs;

use taskboard::auth;
use taskboard::board::Board;
use taskboard::config::Config;
use taskboard::storage::{BoardStorage, KeyValueStore, MemoryStore, ACTIONS_KEY, TASKS_KEY};
use taskboard::task::{TaskDraft, TaskStatus};
use taskboard::user::mock_users;

use support::{alice, TestBoardDir};

#[test]
fn fresh_directory_loads_an_empty_logged_out_board() {
    let dir = TestBoardDir::new();
    let storage = dir.storage();

    let board = storage
        .load_board(&Config::default(), mock_users())
        .expect("load");
    assert!(board.tasks().is_empty());
    assert!(board.action_log().is_empty());
    assert!(storage.load_auth().expect("auth").current_user().is_none());
}

#[test]
fn documents_use_the_browser_keys() {
    let dir = TestBoardDir::new();
    let storage = dir.storage();
    let actor = alice();

    let mut board = Board::new(mock_users());
    let task = board
        .create_task(&actor, TaskDraft::new("Design API"))
        .expect("create");
    board.move_task(&actor, &task.id, TaskStatus::InProgress);
    storage.save_board(&board).expect("save");
    storage
        .save_auth(&auth::login(&mock_users(), "alice@example.com", "pw").expect("login"))
        .expect("save auth");

    let tasks = fs::read_to_string(dir.path().join("collaborative_tasks.json")).expect("tasks");
    assert!(tasks.contains("\"In Progress\""));
    assert!(dir.path().join("collaborative_actions.json").exists());
    let auth_doc =
        fs::read_to_string(dir.path().join("collaborative_todo_auth.json")).expect("auth");
    assert!(auth_doc.contains("\"isAuthenticated\": true"));
}

#[test]
fn reload_applies_configured_log_capacity() {
    let storage = BoardStorage::new(MemoryStore::new());
    let actor = alice();
    let mut board = Board::new(mock_users());
    for i in 0..10 {
        board
            .create_task(&actor, TaskDraft::new(format!("Task {i}")))
            .expect("create");
    }
    storage.save_board(&board).expect("save");

    let mut config = Config::default();
    config.log.capacity = 4;
    let reloaded = storage.load_board(&config, mock_users()).expect("load");
    assert_eq!(reloaded.tasks().len(), 10);
    assert_eq!(reloaded.action_log().len(), 4);
    assert_eq!(
        reloaded.action_log().last().map(|a| a.action.as_str()),
        Some("created task \"Task 9\"")
    );
}

#[test]
fn clearing_unknown_keys_is_harmless() {
    let storage = BoardStorage::new(MemoryStore::new());
    storage.clear_auth().expect("clear");
    storage.store().remove(TASKS_KEY).expect("remove");
    assert!(storage.store().get(ACTIONS_KEY).expect("get").is_none());
}
