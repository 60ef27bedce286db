//! Periodic tick source for a running countdown

use std::{sync::Weak, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::state::{timer_engine::EngineInner, TickOutcome};

/// Fire a tick every `period` starting at `first_tick` until the countdown
/// completes, the engine is dropped, or the registration for `generation`
/// is cancelled.
pub(crate) async fn tick_task(
    engine: Weak<EngineInner>,
    generation: u64,
    first_tick: Instant,
    period: Duration,
) {
    debug!("Starting tick source (generation {})", generation);

    let mut interval = interval_at(first_tick, period);
    // A late tick shifts the following ones instead of bursting to catch up
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(engine) = engine.upgrade() else {
            debug!("Timer engine dropped, stopping tick source");
            break;
        };

        match engine.on_tick(generation) {
            Some(TickOutcome::Advanced) => {}
            Some(TickOutcome::Completed) => {
                debug!("Countdown finished, stopping tick source");
                break;
            }
            None => {
                debug!("Tick source generation {} is stale, stopping", generation);
                break;
            }
        }
    }
}
