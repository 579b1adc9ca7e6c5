//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::board::Board;
use crate::config::{self, Config};
use crate::error::Result;
use crate::storage::{BoardStorage, FileStore};
use crate::user::{mock_users, User};

mod auth;
mod log;
mod task;
mod watch;

/// taskboard - collaborative task board
///
/// Create, move and assign tasks across Todo / In Progress / Done, with an
/// activity feed, edit leases and simulated teammates.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the board state (defaults to the platform data dir)
    #[arg(long, global = true, env = "TASKBOARD_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in as one of the board users
    Login {
        /// Email address
        email: String,

        /// Password (any non-empty value)
        #[arg(long, short)]
        password: String,
    },

    /// Log out
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List board users and their active workload
    Users,

    /// Task operations
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show the activity feed, newest first
    Log {
        /// Maximum entries to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Only actions by this user (id, email or name)
        #[arg(long)]
        user: Option<String>,

        /// Only actions on this task
        #[arg(long)]
        task: Option<String>,

        /// Only actions newer than this (e.g., "30m", "2h")
        #[arg(long)]
        since: Option<String>,
    },

    /// Run simulated teammate activity against the board
    Watch {
        /// Stop after this many generator ticks (default: until Ctrl-C)
        #[arg(long)]
        ticks: Option<u32>,

        /// Override the tick interval (e.g., "2s")
        #[arg(long)]
        interval: Option<String>,

        /// Override the per-tick probability
        #[arg(long)]
        probability: Option<f64>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        #[arg(long, short)]
        description: Option<String>,

        /// low, medium, high
        #[arg(long)]
        priority: Option<String>,

        /// todo, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// Assignee (id, email or name)
        #[arg(long)]
        assign: Option<String>,
    },

    /// Edit a task
    Edit {
        /// Task id or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        status: Option<String>,

        /// Assignee (id, email or name)
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<String>,

        /// Clear the assignee
        #[arg(long)]
        unassign: bool,

        /// What to do if someone else is editing: merge, overwrite
        #[arg(long)]
        on_conflict: Option<String>,
    },

    /// Take the edit lease on a task
    Claim {
        id: String,
    },

    /// Give up your edit lease on a task
    Release {
        id: String,
    },

    /// Delete a task
    Rm {
        id: String,
    },

    /// Move a task to another column
    Move {
        id: String,

        /// todo, in-progress, done
        status: String,
    },

    /// Assign a task to the least-loaded user
    Assign {
        id: String,
    },

    /// List tasks by column
    List {
        /// Only this column
        #[arg(long)]
        status: Option<String>,
    },

    /// Show one task
    Show {
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let data_dir = self.data_dir;
        let json = self.json;
        let quiet = self.quiet;

        match self.command {
            Commands::Login { email, password } => auth::run_login(auth::LoginOptions {
                email,
                password,
                data_dir,
                json,
                quiet,
            }),
            Commands::Logout => auth::run_logout(auth::SessionOptions {
                data_dir,
                json,
                quiet,
            }),
            Commands::Whoami => auth::run_whoami(auth::SessionOptions {
                data_dir,
                json,
                quiet,
            }),
            Commands::Users => auth::run_users(auth::SessionOptions {
                data_dir,
                json,
                quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    description,
                    priority,
                    status,
                    assign,
                } => task::run_new(task::NewOptions {
                    title,
                    description,
                    priority,
                    status,
                    assign,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    priority,
                    status,
                    assign,
                    unassign,
                    on_conflict,
                } => task::run_edit(task::EditOptions {
                    id,
                    title,
                    description,
                    priority,
                    status,
                    assign,
                    unassign,
                    on_conflict,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Claim { id } => task::run_claim(task::TargetOptions {
                    id,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Release { id } => task::run_release(task::TargetOptions {
                    id,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::TargetOptions {
                    id,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Move { id, status } => task::run_move(task::MoveOptions {
                    id,
                    status,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Assign { id } => task::run_assign(task::TargetOptions {
                    id,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::List { status } => task::run_list(task::ListOptions {
                    status,
                    data_dir,
                    json,
                    quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::TargetOptions {
                    id,
                    data_dir,
                    json,
                    quiet,
                }),
            },
            Commands::Log {
                limit,
                user,
                task,
                since,
            } => log::run(log::LogOptions {
                limit,
                user,
                task,
                since,
                data_dir,
                json,
                quiet,
            }),
            Commands::Watch {
                ticks,
                interval,
                probability,
            } => watch::run(watch::WatchOptions {
                ticks,
                interval,
                probability,
                data_dir,
                json,
                quiet,
            }),
        }
    }
}

// =============================================================================
// Shared command context
// =============================================================================

/// Storage and config for a data directory
pub(crate) struct Session {
    pub storage: BoardStorage<FileStore>,
    pub config: Config,
    pub users: Vec<User>,
}

impl Session {
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let dir = config::resolve_data_dir(data_dir);
        let storage = BoardStorage::open(dir.clone())?;
        let config = Config::load_from_dir(&dir)?;
        Ok(Self {
            storage,
            config,
            users: mock_users(),
        })
    }

    /// The logged-in user, or `NotAuthenticated`
    pub fn current_user(&self) -> Result<User> {
        let state = self.storage.load_auth()?;
        Ok(state.require_user()?.clone())
    }

    pub fn load_board(&self) -> Result<Board> {
        self.storage.load_board(&self.config, self.users.clone())
    }
}

/// Everything a board command needs: the session, the acting user and the
/// rehydrated board
pub(crate) struct BoardContext {
    pub session: Session,
    pub user: User,
    pub board: Board,
}

impl BoardContext {
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let session = Session::open(data_dir)?;
        let user = session.current_user()?;
        let board = session.load_board()?;
        Ok(Self {
            session,
            user,
            board,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.session.storage.save_board(&self.board)
    }
}
