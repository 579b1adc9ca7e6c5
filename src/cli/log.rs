//! Activity feed command.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::activity::{format_action, Action, ActionFilter};
use crate::cli::BoardContext;
use crate::error::{Error, Result};
use crate::lease::parse_duration;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct LogOptions {
    pub limit: Option<usize>,
    pub user: Option<String>,
    pub task: Option<String>,
    pub since: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct LogOutput<'a> {
    total: usize,
    capacity: usize,
    actions: Vec<&'a Action>,
}

pub fn run(options: LogOptions) -> Result<()> {
    if options.limit == Some(0) {
        return Err(Error::InvalidArgument("--limit must be at least 1".to_string()));
    }
    let since = match options.since.as_deref() {
        Some(window) => {
            let window = parse_duration(window)?;
            Some(Utc::now().checked_sub_signed(window).ok_or_else(|| {
                Error::InvalidArgument("--since reaches too far back".to_string())
            })?)
        }
        None => None,
    };
    let ctx = BoardContext::load(options.data_dir.as_deref())?;

    // a deleted task still has log entries, so fall back to the raw id
    let task_id = match options.task.as_deref() {
        Some(input) => Some(
            ctx.board
                .resolve_task_id(input)?
                .unwrap_or_else(|| input.trim().to_string()),
        ),
        None => None,
    };
    let filter = ActionFilter {
        user: options.user,
        task_id,
        since,
    };

    let log = ctx.board.action_log();
    let actions = log.recent(&filter, options.limit);

    let mut human = HumanOutput::new("Activity");
    human.push_summary("showing", format!("{} of {}", actions.len(), log.len()));
    for action in &actions {
        human.push_detail(format_action(action));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "log",
        &LogOutput {
            total: actions.len(),
            capacity: log.capacity(),
            actions,
        },
        Some(&human),
    )
}
