//! Run simulated teammate activity against the persisted board.
//!
//! The generator re-reads the stored board before every tick and writes back
//! only the moves it makes, so one-off commands run next to `watch` are never
//! overwritten. Logging out pauses it; logging in as someone else re-arms it
//! for that user.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;

use crate::activity::{format_action, Action};
use crate::board::Board;
use crate::cli::{BoardContext, Session};
use crate::config::ActivityConfig;
use crate::error::{Error, Result};
use crate::output::{emit_line, emit_success, HumanOutput, OutputOptions};
use crate::simulation::{SharedBoard, Simulator};
use crate::storage::{BoardStorage, FileStore};
use crate::user::User;

pub struct WatchOptions {
    pub ticks: Option<u32>,
    pub interval: Option<String>,
    pub probability: Option<f64>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct WatchOutput {
    enabled: bool,
    actions: usize,
}

pub fn run(options: WatchOptions) -> Result<()> {
    if options.ticks == Some(0) {
        return Err(Error::InvalidArgument("--ticks must be at least 1".to_string()));
    }
    let ctx = BoardContext::load(options.data_dir.as_deref())?;
    let activity = activity_settings(&ctx.session.config.activity, &options)?;

    // action lines go to stdout, so the closing envelope is suppressed in JSON mode
    let summary_options = OutputOptions {
        json: false,
        quiet: options.quiet || options.json,
    };

    if !activity.enabled {
        let mut human = HumanOutput::new("Peer activity is disabled");
        human.push_next_step("set [activity] enabled = true in taskboard.toml");
        return emit_success(
            summary_options,
            "watch",
            &WatchOutput {
                enabled: false,
                actions: 0,
            },
            Some(&human),
        );
    }

    let period = activity.interval()?;
    let line_options = OutputOptions {
        json: options.json,
        quiet: options.quiet,
    };
    let BoardContext {
        session,
        user,
        board,
    } = ctx;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let shared: SharedBoard = Arc::new(Mutex::new(board));
    let produced = runtime.block_on(drive(
        &session,
        shared,
        user,
        &activity,
        period,
        options.ticks,
        line_options,
    ))?;

    let mut human = HumanOutput::new("Peer activity stopped");
    human.push_summary("actions", produced.to_string());
    emit_success(
        summary_options,
        "watch",
        &WatchOutput {
            enabled: true,
            actions: produced,
        },
        Some(&human),
    )
}

fn activity_settings(base: &ActivityConfig, options: &WatchOptions) -> Result<ActivityConfig> {
    let mut activity = base.clone();
    if let Some(interval) = &options.interval {
        activity.interval = interval.clone();
        activity.interval().map_err(|_| {
            Error::InvalidArgument(format!(
                "--interval must be a positive duration like 12s or 1m, got '{interval}'"
            ))
        })?;
    }
    if let Some(probability) = options.probability {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidArgument(format!(
                "--probability must be within [0, 1], got {probability}"
            )));
        }
        activity.probability = probability;
    }
    Ok(activity)
}

async fn drive(
    session: &Session,
    board: SharedBoard,
    user: User,
    activity: &ActivityConfig,
    period: Duration,
    ticks: Option<u32>,
    output: OutputOptions,
) -> Result<usize> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
    let gate_storage = session.storage.clone();
    let mut simulator = Simulator::from_config(board.clone(), activity)?
        .before_tick(move |board, armed| sync_before_tick(&gate_storage, board, armed))
        .on_action(move |action| {
            let _ = tx.send(action.clone());
        });
    simulator.rearm(Some(user));

    // half a period of slack so the last tick lands before the deadline;
    // a deadline too far out to represent means running until Ctrl-C
    let deadline = ticks.and_then(|n| period.checked_mul(n)?.checked_add(period / 2));
    let stop = async move {
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };
    tokio::pin!(stop);

    let mut auth_poll = tokio::time::interval(period);
    auth_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let capacity = session.config.log.capacity;
    let mut produced = 0;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = auth_poll.tick() => {
                let logged_in = logged_in_user(&session.storage);
                let armed = simulator.current_user().map(|armed| armed.id.as_str());
                if logged_in.as_ref().map(|user| user.id.as_str()) != armed {
                    match &logged_in {
                        Some(user) => tracing::info!(user = %user.id, "login changed, re-arming peer activity"),
                        None => tracing::info!("logged out, pausing peer activity"),
                    }
                    simulator.rearm(logged_in);
                }
            }
            received = rx.recv() => {
                let Some(action) = received else {
                    break;
                };
                let moved = {
                    let board = board.lock().await;
                    action
                        .task_id
                        .as_deref()
                        .and_then(|id| board.find(id))
                        .cloned()
                };
                let Some(moved) = moved else {
                    continue;
                };
                match session.storage.record_peer_move(&moved, &action, capacity) {
                    Ok(true) => {
                        produced += 1;
                        emit_line(output, &action, &format_action(&action))?;
                    }
                    Ok(false) => {
                        tracing::debug!(task_id = %moved.id, "peer move dropped: task deleted");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to persist peer activity");
                    }
                }
            }
        }
    }

    simulator.stop();
    Ok(produced)
}

/// Runs before every generator tick: skip unless `armed` is still the logged
/// in user, then pick up whatever other commands stored since the last tick.
fn sync_before_tick(storage: &BoardStorage<FileStore>, board: &mut Board, armed: &User) -> bool {
    if !logged_in_user(storage).is_some_and(|user| user.id == armed.id) {
        return false;
    }
    match storage.refresh_board(board) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "failed to reload board, skipping peer activity tick");
            false
        }
    }
}

fn logged_in_user(storage: &BoardStorage<FileStore>) -> Option<User> {
    match storage.load_auth() {
        Ok(state) => state.current_user().cloned(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read login state");
            None
        }
    }
}
