//! Login, logout and user directory commands.

use std::path::PathBuf;

use serde::Serialize;

use crate::assign;
use crate::auth;
use crate::cli::Session;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::user::User;

pub struct LoginOptions {
    pub email: String,
    pub password: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for commands that only need the data directory
pub struct SessionOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct SessionOutput {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

#[derive(Serialize)]
struct UserEntry<'a> {
    #[serde(flatten)]
    user: &'a User,
    active_tasks: usize,
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let session = Session::open(options.data_dir.as_deref())?;
    let state = auth::login(&session.users, &options.email, &options.password)?;
    session.storage.save_auth(&state)?;

    let user = state.require_user()?.clone();
    let mut human = HumanOutput::new(format!("Logged in as {}", user.name));
    human.push_summary("email", user.email.clone());
    if session.config.activity.enabled {
        human.push_next_step("taskboard watch");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "login",
        &SessionOutput {
            authenticated: true,
            user: Some(user),
        },
        Some(&human),
    )
}

pub fn run_logout(options: SessionOptions) -> Result<()> {
    let session = Session::open(options.data_dir.as_deref())?;
    let previous = session.storage.load_auth()?;
    session.storage.clear_auth()?;

    let human = match previous.current_user() {
        Some(user) => {
            tracing::info!(user = %user.id, "logged out");
            HumanOutput::new(format!("Logged out {}", user.name))
        }
        None => HumanOutput::new("Not logged in"),
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "logout",
        &SessionOutput {
            authenticated: false,
            user: None,
        },
        Some(&human),
    )
}

pub fn run_whoami(options: SessionOptions) -> Result<()> {
    let session = Session::open(options.data_dir.as_deref())?;
    let user = session.current_user()?;

    let mut human = HumanOutput::new(user.name.clone());
    human.push_summary("id", user.id.clone());
    human.push_summary("email", user.email.clone());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "whoami",
        &SessionOutput {
            authenticated: true,
            user: Some(user),
        },
        Some(&human),
    )
}

pub fn run_users(options: SessionOptions) -> Result<()> {
    let session = Session::open(options.data_dir.as_deref())?;
    let board = session.load_board()?;
    let loads = assign::workload(board.users(), board.tasks());
    let next = assign::assign(board.users(), board.tasks());

    let entries: Vec<UserEntry<'_>> = loads
        .iter()
        .map(|load| UserEntry {
            user: load.user,
            active_tasks: load.active_tasks,
        })
        .collect();

    let mut human = HumanOutput::new("Users");
    for load in &loads {
        human.push_detail(format!(
            "{} <{}> active: {}",
            load.user.name, load.user.email, load.active_tasks
        ));
    }
    if let Some(next) = next {
        human.push_summary("next smart assignee", next.name.clone());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "users",
        &entries,
        Some(&human),
    )
}
