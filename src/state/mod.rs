//! State management module
//! 
//! This module contains the countdown state, its engine and the server-wide
//! application state.

pub mod app_state;
pub mod duration;
pub mod timer_engine;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use duration::{parse_duration, DurationParseError, MAX_DURATION_SECONDS};
pub use timer_engine::{TimerEngine, DEFAULT_TICK_PERIOD};
pub use timer_state::{format_remaining, ActionIcon, RunState, TickOutcome, TimerSnapshot, TimerState};
