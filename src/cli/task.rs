//! taskboard task command implementations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::{Board, EditEntry};
use crate::cli::BoardContext;
use crate::conflict::{self, ConflictResolution};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
use crate::user::{find_user, User};

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assign: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assign: Option<String>,
    pub unassign: bool,
    pub on_conflict: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for commands that act on a single task
pub struct TargetOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MoveOptions {
    pub id: String,
    pub status: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct ChangeOutput<'a> {
    changed: bool,
    task: &'a Task,
}

#[derive(Serialize)]
struct AssignOutput<'a> {
    task: &'a Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<&'a User>,
}

#[derive(Serialize)]
struct ClaimOutput<'a> {
    task_id: &'a str,
    holder: &'a User,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;

    let mut draft = TaskDraft::new(options.title);
    if let Some(description) = options.description {
        draft = draft.description(description);
    }
    if let Some(priority) = options.priority.as_deref() {
        draft = draft.priority(priority.parse::<TaskPriority>()?);
    }
    if let Some(status) = options.status.as_deref() {
        draft = draft.status(status.parse::<TaskStatus>()?);
    }
    if let Some(assignee) = options.assign.as_deref() {
        draft = draft.assigned_user(Some(lookup_user(&ctx.board, assignee)?));
    }

    let task = ctx.board.create_task(&ctx.user, draft)?;
    ctx.save()?;

    let mut human = HumanOutput::new(format!("Created task \"{}\"", task.title));
    push_task_summary(&mut human, &task);
    if task.assigned_user.is_none() {
        human.push_next_step(format!("taskboard task assign {}", short_id(&task.id)));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task new",
        &task,
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let assigned_user = if options.unassign {
        Some(None)
    } else {
        match options.assign.as_deref() {
            Some(needle) => Some(Some(lookup_user(&ctx.board, needle)?)),
            None => None,
        }
    };
    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        assigned_user,
        status: options
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        priority: options
            .priority
            .as_deref()
            .map(str::parse::<TaskPriority>)
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field".to_string(),
        ));
    }
    let resolution = options
        .on_conflict
        .as_deref()
        .map(str::parse::<ConflictResolution>)
        .transpose()?;

    let mut human = HumanOutput::new("Task updated");
    let updated = match ctx.board.begin_edit(&ctx.user, &id)? {
        None => None,
        Some(EditEntry::Direct { .. }) => ctx.board.update_task(&ctx.user, &id, patch)?,
        Some(EditEntry::Conflict { holder }) => {
            let Some(resolution) = resolution else {
                return Err(Error::EditConflict {
                    holder: holder.name,
                });
            };
            human.push_warning(format!("{resolution} over edit by {}", holder.name));
            ctx.board
                .resolve_conflict(&ctx.user, &id, &resolution, patch)?
        }
    };
    let updated = updated.ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;
    ctx.save()?;

    push_task_summary(&mut human, &updated);
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task edit",
        &updated,
        Some(&human),
    )
}

pub fn run_claim(options: TargetOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let expires_at = match ctx.board.begin_edit(&ctx.user, &id)? {
        Some(EditEntry::Direct { expires_at }) => expires_at,
        Some(EditEntry::Conflict { holder }) => {
            return Err(Error::EditConflict {
                holder: holder.name,
            })
        }
        None => return Err(Error::TaskNotFound(options.id)),
    };
    ctx.save()?;

    let mut human = HumanOutput::new(format!("Editing {}", short_id(&id)));
    human.push_summary("holder", ctx.user.name.clone());
    human.push_summary("expires", expires_at.to_rfc3339());
    human.push_next_step(format!("taskboard task release {}", short_id(&id)));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task claim",
        &ClaimOutput {
            task_id: &id,
            holder: &ctx.user,
            expires_at,
        },
        Some(&human),
    )
}

pub fn run_release(options: TargetOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let released = ctx.board.end_edit(&ctx.user, &id);
    let mut human = HumanOutput::new(format!("Released {}", short_id(&id)));
    if released {
        ctx.save()?;
    } else {
        human.push_warning("you do not hold the edit lease on this task");
    }

    let task = find_task(&ctx.board, &id)?;
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task release",
        &ChangeOutput {
            changed: released,
            task,
        },
        Some(&human),
    )
}

pub fn run_rm(options: TargetOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let removed = ctx
        .board
        .delete_task(&ctx.user, &id)
        .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;
    ctx.save()?;

    let human = HumanOutput::new(format!("Deleted task \"{}\"", removed.title));
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task rm",
        &removed,
        Some(&human),
    )
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let changed = ctx.board.move_task(&ctx.user, &id, status);
    let mut human = HumanOutput::new(format!("Moved {} to {status}", short_id(&id)));
    if changed {
        ctx.save()?;
    } else {
        human.push_warning(format!("already in {status}; nothing changed"));
    }

    let task = find_task(&ctx.board, &id)?;
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task move",
        &ChangeOutput { changed, task },
        Some(&human),
    )
}

pub fn run_assign(options: TargetOptions) -> Result<()> {
    let mut ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;

    let assignee = ctx.board.smart_assign(&ctx.user, &id);
    let mut human = match &assignee {
        Some(user) => HumanOutput::new(format!("Assigned {} to {}", short_id(&id), user.name)),
        None => {
            let mut human = HumanOutput::new(format!("Left {} unassigned", short_id(&id)));
            human.push_warning("no users to assign");
            human
        }
    };
    if assignee.is_some() {
        ctx.save()?;
    }

    let task = find_task(&ctx.board, &id)?;
    push_task_summary(&mut human, task);
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task assign",
        &AssignOutput {
            task,
            assignee: assignee.as_ref(),
        },
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let filter = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let ctx = BoardContext::load(options.data_dir.as_deref())?;

    let columns: Vec<TaskStatus> = match filter {
        Some(status) => vec![status],
        None => TaskStatus::ALL.to_vec(),
    };

    let mut tasks = Vec::new();
    let mut human = HumanOutput::new("Tasks");
    for status in columns {
        let column: Vec<&Task> = ctx.board.tasks_by_status(status).collect();
        human.push_summary(status.as_str(), column.len().to_string());
        for task in &column {
            human.push_detail(task_line(task));
        }
        tasks.extend(column);
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &TaskListOutput {
            total: tasks.len(),
            tasks,
        },
        Some(&human),
    )
}

pub fn run_show(options: TargetOptions) -> Result<()> {
    let ctx = BoardContext::load(options.data_dir.as_deref())?;
    let id = resolve_task(&ctx.board, &options.id)?;
    let task = find_task(&ctx.board, &id)?;

    let mut human = HumanOutput::new(task.title.clone());
    push_task_summary(&mut human, task);
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }
    if conflict::has_conflict(task, &ctx.user) {
        if let Some(editor) = task.editing_by() {
            human.push_warning(format!("being edited by {}", editor.name));
            human.push_next_step(format!(
                "taskboard task edit {} --on-conflict merge",
                short_id(&task.id)
            ));
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task show",
        task,
        Some(&human),
    )
}

// =============================================================================
// Helpers
// =============================================================================

fn resolve_task(board: &Board, input: &str) -> Result<String> {
    board
        .resolve_task_id(input)?
        .ok_or_else(|| Error::TaskNotFound(input.to_string()))
}

fn find_task<'a>(board: &'a Board, id: &str) -> Result<&'a Task> {
    board
        .find(id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

fn lookup_user(board: &Board, needle: &str) -> Result<User> {
    find_user(board.users(), needle)
        .cloned()
        .ok_or_else(|| Error::InvalidArgument(format!("unknown user '{needle}'")))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}][{}] {} {}",
        task.status,
        task.priority,
        short_id(&task.id),
        task.title
    );
    if let Some(user) = &task.assigned_user {
        line.push_str(&format!(" (@{})", user.name));
    }
    if let Some(editor) = task.editing_by() {
        line.push_str(&format!(" (editing: {})", editor.name));
    }
    line
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("id", task.id.clone());
    human.push_summary("status", task.status.to_string());
    human.push_summary("priority", task.priority.to_string());
    let assignee = task
        .assigned_user
        .as_ref()
        .map(|user| user.name.clone())
        .unwrap_or_else(|| "unassigned".to_string());
    human.push_summary("assignee", assignee);
}
