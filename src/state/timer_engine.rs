//! Countdown engine: owns the timer state, drives the tick source and
//! publishes snapshots to observers

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use super::{duration::parse_duration, timer_state::TickOutcome, RunState, TimerSnapshot, TimerState};
use crate::tasks::tick_task;

/// Nominal tick period
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// State guarded by the engine lock
#[derive(Debug)]
struct EngineSlot {
    timer: TimerState,
    /// Identifies the live tick source; bumped on every cancellation
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

/// Shared half of the engine. The tick task only holds a weak reference to it.
#[derive(Debug)]
pub(crate) struct EngineInner {
    slot: Mutex<EngineSlot>,
    updates_tx: watch::Sender<TimerSnapshot>,
    tick_period: Duration,
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, EngineSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, timer: &TimerState) -> TimerSnapshot {
        let snapshot = timer.snapshot();
        self.updates_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Apply one tick from the tick source spawned for `generation`.
    ///
    /// Returns `None` when that source has been cancelled in the meantime, in
    /// which case the state is left untouched.
    pub(crate) fn on_tick(&self, generation: u64) -> Option<TickOutcome> {
        let mut slot = self.lock();
        if slot.generation != generation || !slot.timer.is_running() {
            return None;
        }

        let was_locked = slot.timer.edit_locked();
        let outcome = slot.timer.tick();
        debug!(
            "Tick {}/{} ({})",
            slot.timer.elapsed_ticks,
            slot.timer.duration_seconds,
            slot.timer.display_text()
        );
        if !was_locked && slot.timer.edit_locked() {
            debug!("Duration input locked");
        }

        if outcome == TickOutcome::Completed {
            info!("Countdown of {}s completed", slot.timer.duration_seconds);
            // The task exits on its own after this tick
            slot.ticker = None;
        }

        self.publish(&slot.timer);
        Some(outcome)
    }
}

fn cancel_ticker(slot: &mut EngineSlot) {
    slot.generation = slot.generation.wrapping_add(1);
    if let Some(ticker) = slot.ticker.take() {
        ticker.abort();
        debug!("Tick source cancelled");
    }
}

/// Countdown timer engine.
///
/// All intents are total: they always succeed and return the resulting
/// snapshot. Starting a run spawns a Tokio task, so `start` and `restart`
/// must be called from within a Tokio runtime. Dropping the engine cancels
/// any active tick source.
#[derive(Debug)]
pub struct TimerEngine {
    inner: Arc<EngineInner>,
}

impl TimerEngine {
    /// Create an idle engine with the nominal one-second tick
    pub fn new(duration_seconds: u32) -> Self {
        Self::with_tick_period(duration_seconds, DEFAULT_TICK_PERIOD)
    }

    /// Create an idle engine with a custom tick period
    pub fn with_tick_period(duration_seconds: u32, tick_period: Duration) -> Self {
        let timer = TimerState::new(duration_seconds.min(super::MAX_DURATION_SECONDS));
        let (updates_tx, _) = watch::channel(timer.snapshot());

        Self {
            inner: Arc::new(EngineInner {
                slot: Mutex::new(EngineSlot {
                    timer,
                    generation: 0,
                    ticker: None,
                }),
                updates_tx,
                tick_period,
            }),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.lock().timer.snapshot()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.inner.updates_tx.subscribe()
    }

    pub fn tick_period(&self) -> Duration {
        self.inner.tick_period
    }

    /// Set the duration from user-entered text.
    ///
    /// Ignored while a run is in progress and while the edit lock holds, i.e.
    /// until a restart clears the elapsed ticks. Malformed input counts as zero.
    pub fn set_duration(&self, input: &str) -> TimerSnapshot {
        let mut slot = self.inner.lock();
        if slot.timer.is_running() || slot.timer.edit_locked() {
            warn!(
                "Ignoring duration change to {:?} while {} at {}s",
                input, slot.timer.run_state, slot.timer.elapsed_ticks
            );
            return slot.timer.snapshot();
        }

        let duration_seconds = parse_duration(input).unwrap_or_else(|e| {
            warn!("{}, using 0 seconds", e);
            0
        });

        cancel_ticker(&mut slot);
        slot.timer.set_duration(duration_seconds);
        info!("Duration set to {}s", duration_seconds);
        self.inner.publish(&slot.timer)
    }

    /// Start or resume the countdown. A no-op while already running.
    pub fn start(&self) -> TimerSnapshot {
        let mut slot = self.inner.lock();
        self.start_locked(&mut slot)
    }

    fn start_locked(&self, slot: &mut EngineSlot) -> TimerSnapshot {
        match slot.timer.run_state {
            RunState::Running => {
                debug!("Start requested while already running");
                return slot.timer.snapshot();
            }
            RunState::Completed => {
                slot.timer.rewind();
            }
            RunState::Idle | RunState::Paused => {}
        }

        cancel_ticker(slot);

        if slot.timer.duration_seconds == 0 {
            info!("Zero duration, completing without ticking");
            slot.timer.run_state = RunState::Completed;
            return self.inner.publish(&slot.timer);
        }

        slot.timer.run_state = RunState::Running;
        let generation = slot.generation;
        let period = self.inner.tick_period;
        let first_tick = Instant::now() + period;
        slot.ticker = Some(tokio::spawn(tick_task(
            Arc::downgrade(&self.inner),
            generation,
            first_tick,
            period,
        )));

        info!(
            "Countdown running: {}s elapsed of {}s",
            slot.timer.elapsed_ticks, slot.timer.duration_seconds
        );
        self.inner.publish(&slot.timer)
    }

    /// Stop ticking and keep the elapsed time. Idempotent.
    pub fn pause(&self) -> TimerSnapshot {
        let mut slot = self.inner.lock();
        cancel_ticker(&mut slot);

        if slot.timer.is_running() {
            slot.timer.run_state = RunState::Paused;
            info!("Countdown paused at {}s", slot.timer.elapsed_ticks);
            return self.inner.publish(&slot.timer);
        }
        slot.timer.snapshot()
    }

    /// Rewind to zero elapsed and start a fresh run
    pub fn restart(&self) -> TimerSnapshot {
        let mut slot = self.inner.lock();
        cancel_ticker(&mut slot);

        slot.timer.rewind();
        slot.timer.run_state = RunState::Idle;
        info!("Countdown restarted");
        self.start_locked(&mut slot)
    }

    /// Cancel any active tick source. A running countdown is left paused at
    /// the last tick it reached.
    pub fn dispose(&self) {
        let mut slot = self.inner.lock();
        cancel_ticker(&mut slot);
        if slot.timer.is_running() {
            slot.timer.run_state = RunState::Paused;
            self.inner.publish(&slot.timer);
        }
        debug!("Timer engine disposed");
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        let mut slot = self.inner.lock();
        cancel_ticker(&mut slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ActionIcon;
    use tokio::time::sleep;

    fn engine_with(input: &str) -> TimerEngine {
        let engine = TimerEngine::new(10);
        engine.set_duration(input);
        engine
    }

    #[test]
    fn set_duration_resets_to_idle() {
        for (input, expected) in [("0", 0), ("1", 1), ("65", 65), ("3599", 3599)] {
            let snapshot = engine_with(input).snapshot();
            assert_eq!(snapshot.duration_seconds, expected);
            assert_eq!(snapshot.elapsed_ticks, 0);
            assert_eq!(snapshot.run_state, RunState::Idle);
            assert!(!snapshot.edit_locked);
            let expected_progress = if expected == 0 { 1.0 } else { 0.0 };
            assert_eq!(snapshot.progress, expected_progress);
        }
    }

    #[test]
    fn set_duration_normalizes_odd_input() {
        assert_eq!(engine_with("").snapshot().duration_seconds, 0);
        assert_eq!(engine_with("5000").snapshot().duration_seconds, 3599);
        assert_eq!(engine_with("abc").snapshot().duration_seconds, 0);
        assert_eq!(engine_with("7.8").snapshot().duration_seconds, 7);
    }

    #[test]
    fn display_text_at_tick_zero() {
        assert_eq!(engine_with("65").snapshot().display_text, "1m 5s");
        assert_eq!(engine_with("5").snapshot().display_text, "5s");
    }

    #[test]
    fn pause_without_run_is_a_no_op() {
        let engine = TimerEngine::new(10);
        let snapshot = engine.pause();
        assert_eq!(snapshot.run_state, RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn run_completes_after_duration_ticks() {
        let engine = engine_with("3");
        let snapshot = engine.start();
        assert_eq!(snapshot.run_state, RunState::Running);
        assert_eq!(snapshot.action_icon, ActionIcon::Pause);

        sleep(Duration::from_millis(1500)).await;
        let mid = engine.snapshot();
        assert_eq!(mid.elapsed_ticks, 1);
        assert!(mid.edit_locked);

        sleep(Duration::from_millis(2000)).await;
        let done = engine.snapshot();
        assert_eq!(done.run_state, RunState::Completed);
        assert_eq!(done.elapsed_ticks, 3);
        assert_eq!(done.progress, 1.0);
        assert!(done.edit_locked);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.snapshot().elapsed_ticks, 3);

        let restarted = engine.restart();
        assert_eq!(restarted.elapsed_ticks, 0);
        assert!(!restarted.edit_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticks_until_started_again() {
        let engine = engine_with("10");
        engine.start();

        sleep(Duration::from_millis(1500)).await;
        let paused = engine.pause();
        assert_eq!(paused.elapsed_ticks, 1);
        assert_eq!(paused.run_state, RunState::Paused);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.snapshot().elapsed_ticks, 1);

        let again = engine.pause();
        assert_eq!(again, paused);

        engine.start();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.snapshot().elapsed_ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_one_tick_source() {
        let engine = engine_with("10");
        engine.start();
        engine.start();

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(engine.snapshot().elapsed_ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_runs_from_any_state() {
        let engine = engine_with("10");

        let from_idle = engine.restart();
        assert_eq!(from_idle.run_state, RunState::Running);

        sleep(Duration::from_millis(2500)).await;
        let from_running = engine.restart();
        assert_eq!(from_running.run_state, RunState::Running);
        assert_eq!(from_running.elapsed_ticks, 0);

        sleep(Duration::from_millis(1500)).await;
        engine.pause();
        let from_paused = engine.restart();
        assert_eq!(from_paused.run_state, RunState::Running);
        assert_eq!(from_paused.elapsed_ticks, 0);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.snapshot().elapsed_ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_completes_immediately() {
        let engine = engine_with("");
        let snapshot = engine.start();
        assert_eq!(snapshot.run_state, RunState::Completed);
        assert_eq!(snapshot.progress, 1.0);
        assert_eq!(snapshot.elapsed_ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_change_ignored_while_running() {
        let engine = engine_with("10");
        engine.start();
        let snapshot = engine.set_duration("30");
        assert_eq!(snapshot.duration_seconds, 10);
        assert_eq!(snapshot.run_state, RunState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_every_tick() {
        let engine = engine_with("2");
        let mut rx = engine.subscribe();
        engine.start();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().run_state, RunState::Running);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().elapsed_ticks, 1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().run_state, RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_engine_closes_updates() {
        let engine = engine_with("10");
        let mut rx = engine.subscribe();
        engine.start();
        rx.borrow_and_update();

        drop(engine);
        sleep(Duration::from_secs(3)).await;
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn duration_change_ignored_after_pause_and_completion() {
        let engine = engine_with("2");
        engine.start();
        sleep(Duration::from_millis(1500)).await;
        engine.pause();

        let paused = engine.set_duration("30");
        assert_eq!(paused.duration_seconds, 2);
        assert_eq!(paused.elapsed_ticks, 1);
        assert_eq!(paused.run_state, RunState::Paused);

        engine.start();
        sleep(Duration::from_millis(1500)).await;
        let completed = engine.set_duration("30");
        assert_eq!(completed.duration_seconds, 2);
        assert_eq!(completed.run_state, RunState::Completed);

        engine.restart();
        engine.pause();
        let unlocked = engine.set_duration("30");
        assert_eq!(unlocked.duration_seconds, 30);
        assert_eq!(unlocked.run_state, RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_tick_leaves_state_untouched() {
        let engine = engine_with("10");
        engine.start();
        let first_generation = engine.inner.lock().generation;

        engine.pause();
        let paused = engine.snapshot();
        assert_eq!(engine.inner.on_tick(first_generation), None);
        assert_eq!(engine.snapshot(), paused);

        // A newer run does not accept ticks from the cancelled source either
        engine.start();
        let running = engine.snapshot();
        assert_eq!(engine.inner.on_tick(first_generation), None);
        assert_eq!(engine.snapshot(), running);

        let live_generation = engine.inner.lock().generation;
        assert_eq!(engine.inner.on_tick(live_generation), Some(TickOutcome::Advanced));
        assert_eq!(engine.snapshot().elapsed_ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_the_run() {
        let engine = engine_with("10");
        engine.start();
        sleep(Duration::from_millis(1500)).await;

        engine.dispose();
        sleep(Duration::from_secs(3)).await;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.elapsed_ticks, 1);
        assert_eq!(snapshot.run_state, RunState::Paused);
    }
}
