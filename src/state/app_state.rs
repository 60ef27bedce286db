//! Main application state management

use std::{
    sync::{Mutex, PoisonError},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{format_remaining, TimerEngine, TimerSnapshot};

/// Intents the presentation layer can send to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SetDuration,
    Start,
    Pause,
    Restart,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SetDuration => "set-duration",
            Intent::Start => "start",
            Intent::Pause => "pause",
            Intent::Restart => "restart",
        }
    }
}

/// Last intent received and when
#[derive(Debug, Clone, Default)]
struct LastAction {
    intent: Option<Intent>,
    time: Option<DateTime<Utc>>,
}

/// Main application state: the timer engine plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// The one countdown this server drives
    pub engine: TimerEngine,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    last_action: Mutex<LastAction>,
}

impl AppState {
    /// Create a new AppState around an engine
    pub fn new(port: u16, host: String, engine: TimerEngine) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(LastAction::default()),
        }
    }

    /// Forward an intent to the engine and record it as the last action
    pub fn apply(&self, intent: Intent, input: Option<&str>) -> TimerSnapshot {
        let snapshot = match intent {
            Intent::SetDuration => self.engine.set_duration(input.unwrap_or_default()),
            Intent::Start => self.engine.start(),
            Intent::Pause => self.engine.pause(),
            Intent::Restart => self.engine.restart(),
        };

        let mut last = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        last.intent = Some(intent);
        last.time = Some(Utc::now());
        debug!("Applied intent {} -> {}", intent.as_str(), snapshot.run_state);

        snapshot
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let hours = secs / 3600;

        if hours > 0 {
            let minutes = (secs % 3600) / 60;
            format!("{}h {}m {}s", hours, minutes, secs % 60)
        } else {
            // Under an hour fits the countdown label format
            format_remaining((secs % 3600) as u32)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        (last.intent.map(|i| i.as_str().to_string()), last.time)
    }
}
