//! Countdown Timer - a tick-driven countdown engine with an HTTP front
//! 
//! The engine owns the timer state, advances it once per tick and publishes
//! snapshots that a presentation layer renders. The HTTP API relays the
//! start, pause, restart and set-duration intents into it.

pub mod config;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, RunState, TimerEngine, TimerSnapshot};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
