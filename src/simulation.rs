//! Simulated peer activity.
//!
//! While a user is logged in, a background task periodically pretends another
//! team member moved a task to a random column. Each produced change goes
//! through the board like any other edit and is logged under the peer's name.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::activity::Action;
use crate::board::Board;
use crate::config::ActivityConfig;
use crate::error::Result;
use crate::task::TaskStatus;
use crate::user::{other_users, User};

/// Board shared between the foreground and the generator
pub type SharedBoard = Arc<Mutex<Board>>;

/// Called with every action the generator produces
pub type ActionObserver = Arc<dyn Fn(&Action) + Send + Sync>;

/// Runs under the board lock right before each tick with the armed user.
/// Returning `false` skips the tick.
pub type TickGate = Arc<dyn Fn(&mut Board, &User) -> bool + Send + Sync>;

/// Shortest period the timer accepts
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// One tick of the generator, independent of any timer.
#[derive(Debug, Clone, Copy)]
pub struct PeerActivity {
    probability: f64,
}

impl PeerActivity {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Maybe produce a peer change.
    ///
    /// With the configured probability, picks a random task, a random user
    /// other than `current_user` and a random status, then replaces the task
    /// with the new status and logs the move under the peer's name. Picking
    /// the task's current status still counts as a move.
    pub fn tick<R: Rng>(
        &self,
        board: &mut Board,
        current_user: &User,
        rng: &mut R,
    ) -> Option<Action> {
        if rng.random::<f64>() >= self.probability || board.tasks().is_empty() {
            return None;
        }

        let task = board.tasks()[rng.random_range(0..board.tasks().len())].clone();
        let peers = other_users(board.users(), current_user);
        if peers.is_empty() {
            debug!("peer activity skipped: no other users");
            return None;
        }
        let peer = peers[rng.random_range(0..peers.len())].clone();
        let status = TaskStatus::ALL[rng.random_range(0..TaskStatus::ALL.len())];

        let mut moved = task;
        moved.status = status;
        moved.touch(Utc::now());
        let action = Action::new(
            peer,
            format!("moved task \"{}\" to {}", moved.title, status),
        )
        .with_task(moved.id.clone());

        board.apply_remote(moved);
        board.log_action(action.clone());
        Some(action)
    }
}

impl From<&ActivityConfig> for PeerActivity {
    fn from(config: &ActivityConfig) -> Self {
        Self::new(config.probability)
    }
}

// =============================================================================
// Background driver
// =============================================================================

struct Running {
    user: User,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the generator task. At most one is running at a time.
///
/// Must be used from within a tokio runtime. Dropping the simulator stops
/// the generator.
pub struct Simulator {
    board: SharedBoard,
    activity: PeerActivity,
    period: Duration,
    seed: Option<u64>,
    observer: Option<ActionObserver>,
    gate: Option<TickGate>,
    running: Option<Running>,
}

impl Simulator {
    pub fn new(board: SharedBoard, activity: PeerActivity, period: Duration) -> Self {
        Self {
            board,
            activity,
            period: period.max(MIN_PERIOD),
            seed: None,
            observer: None,
            gate: None,
            running: None,
        }
    }

    /// Build from the `[activity]` config section
    pub fn from_config(board: SharedBoard, config: &ActivityConfig) -> Result<Self> {
        Ok(Self::new(board, PeerActivity::from(config), config.interval()?))
    }

    /// Use a deterministic random source
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn on_action(mut self, observer: impl Fn(&Action) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Check or refresh the board before every tick
    pub fn before_tick(
        mut self,
        gate: impl Fn(&mut Board, &User) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// User the generator is currently running for
    pub fn current_user(&self) -> Option<&User> {
        self.running.as_ref().map(|running| &running.user)
    }

    /// Re-arm for a new login state: stop any running generator, then start
    /// one for `user` if there is a user.
    pub fn rearm(&mut self, user: Option<User>) {
        self.stop();
        let Some(user) = user else {
            return;
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let handle = tokio::spawn(run_generator(
            self.board.clone(),
            self.activity,
            user.clone(),
            self.period,
            self.observer.clone(),
            self.gate.clone(),
            shutdown_rx,
            rng,
        ));
        info!(user = %user.id, period = ?self.period, "peer activity started");
        self.running = Some(Running {
            user,
            shutdown,
            handle,
        });
    }

    /// Stop the generator. Safe to call when nothing is running.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.handle.abort();
            info!(user = %running.user.id, "peer activity stopped");
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_generator(
    board: SharedBoard,
    activity: PeerActivity,
    user: User,
    period: Duration,
    observer: Option<ActionObserver>,
    gate: Option<TickGate>,
    mut shutdown: watch::Receiver<bool>,
    mut rng: StdRng,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let produced = {
                    let mut board = board.lock().await;
                    if gate.as_ref().is_some_and(|gate| !gate(&mut *board, &user)) {
                        debug!(user = %user.id, "peer activity tick skipped");
                        continue;
                    }
                    activity.tick(&mut board, &user, &mut rng)
                };
                if let Some(action) = produced {
                    debug!(peer = %action.user.id, action = %action.action, "peer activity");
                    if let Some(observer) = &observer {
                        observer(&action);
                    }
                }
            }
        }
    }
}
