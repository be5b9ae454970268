//! GameLoop implementation

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::item::{CyclePhase, ItemFailure, LoopItem};

use super::config::{self, GameLoopConfig};

/// Buffer size for the failure reporter channel
const FAILURE_CHANNEL_BUFFER: usize = 64;

/// Loop lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Idle, no cycle scheduled (initial state, and after end())
    #[default]
    Unknown,
    /// Cycle actively re-scheduling itself
    Looping,
    /// Cycle stopped re-scheduling; items and configuration persist
    Paused,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Looping => write!(f, "looping"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// Internal state protected by mutex
struct LoopInner {
    /// Registered items, insertion order preserved
    items: Vec<Arc<dyn LoopItem>>,

    /// Lifecycle state
    state: LoopState,

    /// Target time budget between the start of consecutive cycles
    tick_interval: Duration,

    /// Start instant of the previous cycle
    last_tick: Option<Instant>,

    /// Arming token. Every (re-)arm and end() bumps it; a driver holding a
    /// stale token terminates without re-scheduling.
    generation: u64,

    /// Failure collaborator, if installed
    reporter: Option<mpsc::Sender<ItemFailure>>,
}

/// Decision taken at the end of a cycle
enum CycleOutcome {
    /// Run the next cycle after the wait
    Rearm { wait: Duration },
    /// Stop re-scheduling
    Halt,
}

/// The GameLoop drives a dynamic collection of items through an
/// input -> update -> render cycle at a fixed tick rate.
///
/// Handles are cheap to clone and share one loop, so items can call back
/// into the loop (add/remove/lookup) from their own callbacks. Each cycle
/// visits the items registered at cycle start; mutations land at phase
/// boundaries, so an item removed mid-cycle drops out of the remaining
/// phases and an item added mid-cycle first runs in the following cycle.
#[derive(Clone)]
pub struct GameLoop {
    auto_start: bool,
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<LoopInner>>,
}

impl GameLoop {
    /// Create a loop with the default configuration (15 cycles/second,
    /// auto-start on first item)
    pub fn new() -> Self {
        Self::with_config(GameLoopConfig::default())
    }

    /// Create a loop with the given configuration
    pub fn with_config(config: GameLoopConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a loop with the given configuration and time source
    pub fn with_clock(config: GameLoopConfig, clock: Arc<dyn Clock>) -> Self {
        debug!(?config, "GameLoop::with_clock: called");
        Self {
            auto_start: config.auto_start,
            clock,
            inner: Arc::new(Mutex::new(LoopInner {
                items: Vec::new(),
                state: LoopState::Unknown,
                tick_interval: config.tick_interval(),
                last_tick: None,
                generation: 0,
                reporter: None,
            })),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> LoopState {
        self.inner.lock().await.state
    }

    /// Append an item to the collection
    ///
    /// Ids are not validated; duplicate ids are permitted and lookups return
    /// the first match. When the collection was empty, the cycle is armed if
    /// the loop is already looping, or started outright in the auto-start
    /// configuration.
    pub async fn add_item(&self, item: Arc<dyn LoopItem>) {
        debug!(item_id = %item.id(), "GameLoop::add_item: called");
        let mut inner = self.inner.lock().await;
        let was_empty = inner.items.is_empty();
        inner.items.push(item);

        if !was_empty {
            return;
        }
        match inner.state {
            // The driver halts when the collection drains; re-arm it.
            LoopState::Looping => self.arm(&mut inner),
            LoopState::Unknown if self.auto_start => {
                inner.state = LoopState::Looping;
                self.arm(&mut inner);
            }
            _ => {}
        }
    }

    /// First item with the given id, if any
    pub async fn get_item(&self, id: &str) -> Option<Arc<dyn LoopItem>> {
        debug!(%id, "GameLoop::get_item: called");
        let inner = self.inner.lock().await;
        inner.items.iter().find(|item| item.id() == id).cloned()
    }

    /// Remove and return the first item with the given id
    pub async fn remove_item(&self, id: &str) -> Option<Arc<dyn LoopItem>> {
        debug!(%id, "GameLoop::remove_item: called");
        let mut inner = self.inner.lock().await;
        let index = inner.items.iter().position(|item| item.id() == id)?;
        Some(inner.items.remove(index))
    }

    /// Reconfigure the target cycle rate
    ///
    /// Non-positive and NaN rates clamp to a minimal positive rate rather
    /// than producing a zero or negative interval. Takes effect at the next
    /// re-scheduling decision.
    pub async fn set_fps(&self, fps: f64) {
        let interval = config::tick_interval_for(fps);
        debug!(fps, ?interval, "GameLoop::set_fps: called");
        self.inner.lock().await.tick_interval = interval;
    }

    /// Begin cycling
    ///
    /// No-op while already looping. Starting with no items schedules
    /// nothing; the first add_item arms the cycle.
    pub async fn start(&self) {
        debug!("GameLoop::start: called");
        let mut inner = self.inner.lock().await;
        if inner.state == LoopState::Looping {
            return;
        }
        inner.state = LoopState::Looping;
        if !inner.items.is_empty() {
            self.arm(&mut inner);
        }
    }

    /// Stop re-scheduling at the end of the in-flight cycle
    ///
    /// Items and configuration persist; unpause() resumes. No-op unless
    /// currently looping.
    pub async fn pause(&self) {
        debug!("GameLoop::pause: called");
        let mut inner = self.inner.lock().await;
        if inner.state == LoopState::Looping {
            inner.state = LoopState::Paused;
        }
    }

    /// Resume cycling after pause()
    ///
    /// Resets the elapsed-time baseline so the first update after a long
    /// pause does not see the whole pause as elapsed time. No-op unless
    /// currently paused.
    pub async fn unpause(&self) {
        debug!("GameLoop::unpause: called");
        let mut inner = self.inner.lock().await;
        if inner.state != LoopState::Paused {
            return;
        }
        inner.state = LoopState::Looping;
        if !inner.items.is_empty() {
            self.arm(&mut inner);
        }
    }

    /// Terminate the loop
    ///
    /// Any pending cycle observes the change and terminates without
    /// re-scheduling. Registered items are retained; a fresh start() is
    /// required to cycle again.
    pub async fn end(&self) {
        debug!("GameLoop::end: called");
        let mut inner = self.inner.lock().await;
        inner.state = LoopState::Unknown;
        inner.last_tick = None;
        // Invalidate any driver still sleeping toward its next cycle.
        inner.generation = inner.generation.wrapping_add(1);
    }

    /// Install a failure reporter and return its receiving end
    ///
    /// Replaces any previously installed reporter. Failures are forwarded
    /// with try_send so a slow consumer never stalls the cycle.
    pub async fn failure_reports(&self) -> mpsc::Receiver<ItemFailure> {
        debug!("GameLoop::failure_reports: called");
        let (tx, rx) = mpsc::channel(FAILURE_CHANNEL_BUFFER);
        self.inner.lock().await.reporter = Some(tx);
        rx
    }

    /// Arm the driver task for the next cycle
    ///
    /// Bumps the generation so any previously armed driver terminates at its
    /// next checkpoint, then spawns a fresh driver keyed to the new
    /// generation. Re-entrant start/unpause calls therefore cannot
    /// double-arm the loop.
    fn arm(&self, inner: &mut LoopInner) {
        inner.generation = inner.generation.wrapping_add(1);
        inner.last_tick = Some(self.clock.now());
        let generation = inner.generation;
        debug!(generation, "GameLoop::arm: driver spawned");
        let this = self.clone();
        tokio::spawn(async move {
            this.drive(generation).await;
        });
    }

    /// Driver task: run cycles until told to halt
    async fn drive(self, generation: u64) {
        loop {
            match self.run_cycle(generation).await {
                CycleOutcome::Rearm { wait } => tokio::time::sleep(wait).await,
                CycleOutcome::Halt => return,
            }
        }
    }

    /// One full input -> update -> render pass plus the re-scheduling decision
    async fn run_cycle(&self, generation: u64) -> CycleOutcome {
        // Top of cycle: observe pause/end that landed during the sleep.
        let (elapsed, input_items) = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation || inner.state != LoopState::Looping || inner.items.is_empty() {
                debug!(generation, state = %inner.state, "GameLoop::run_cycle: halting");
                return CycleOutcome::Halt;
            }
            let now = self.clock.now();
            let elapsed = inner.last_tick.map(|tick| now.duration_since(tick)).unwrap_or_default();
            inner.last_tick = Some(now);
            (elapsed, inner.items.clone())
        };

        // Input phase: handlers run concurrently; the phase completes once
        // every one has settled.
        let results = join_all(input_items.iter().map(|item| item.handle_input())).await;
        for (item, result) in input_items.iter().zip(results) {
            if let Err(error) = result {
                self.report_failure(item.id(), CyclePhase::Input, error).await;
            }
        }

        // Update phase: sequential, insertion order. Items removed during the
        // input phase drop out here; items added mid-cycle are not visited
        // until the next cycle.
        let update_items = self.retain_present(input_items).await;
        for item in &update_items {
            if let Err(error) = item.update(elapsed).await {
                self.report_failure(item.id(), CyclePhase::Update, error).await;
            }
        }

        // Post-update sweep: completion is probed after all updates have
        // settled, so an item finishing mid-phase was still updated once
        // more, never skipped. Removal is applied after the render phase; the
        // finishing item gets its full final cycle.
        let render_items = self.retain_present(update_items).await;
        let finished: Vec<Arc<dyn LoopItem>> = render_items
            .iter()
            .filter(|item| item.is_finished())
            .cloned()
            .collect();

        // Render phase
        for item in &render_items {
            if let Err(error) = item.render().await {
                self.report_failure(item.id(), CyclePhase::Render, error).await;
            }
        }

        if !finished.is_empty() {
            let removed = self.prune(&finished).await;
            debug!(removed, "GameLoop::run_cycle: pruned finished items");
        }

        // Re-scheduling decision. Fixed rate with catch-up: an overrun cycle
        // fires the next one immediately instead of compounding the delay.
        let inner = self.inner.lock().await;
        if inner.generation != generation || inner.state != LoopState::Looping || inner.items.is_empty() {
            debug!(generation, state = %inner.state, "GameLoop::run_cycle: not re-arming");
            return CycleOutcome::Halt;
        }
        CycleOutcome::Rearm {
            wait: inner.tick_interval.saturating_sub(elapsed),
        }
    }

    /// Filter a phase's item list down to those still registered
    ///
    /// Matches by identity, not id, so removing one of two id-duplicates
    /// never drops the other from the rest of the cycle.
    async fn retain_present(&self, items: Vec<Arc<dyn LoopItem>>) -> Vec<Arc<dyn LoopItem>> {
        let inner = self.inner.lock().await;
        items
            .into_iter()
            .filter(|item| inner.items.iter().any(|present| Arc::ptr_eq(present, item)))
            .collect()
    }

    /// Remove the given items from the collection; returns how many were
    /// actually present
    ///
    /// Matches by identity, not id, so an id-duplicate is never pruned in
    /// place of the item that finished.
    async fn prune(&self, finished: &[Arc<dyn LoopItem>]) -> usize {
        let mut inner = self.inner.lock().await;
        let before = inner.items.len();
        inner
            .items
            .retain(|item| !finished.iter().any(|f| Arc::ptr_eq(f, item)));
        before - inner.items.len()
    }

    /// Log a callback failure and forward it to the reporter if installed
    async fn report_failure(&self, item_id: &str, phase: CyclePhase, error: eyre::Report) {
        warn!(%item_id, %phase, %error, "Item callback failed");
        let reporter = self.inner.lock().await.reporter.clone();
        if let Some(tx) = reporter {
            let failure = ItemFailure {
                item_id: item_id.to_string(),
                phase,
                error,
            };
            if let Err(e) = tx.try_send(failure) {
                debug!(%item_id, error = %e, "Failure report dropped");
            }
        }
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
