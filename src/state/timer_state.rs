//! Timer state structure and the tick transition

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a countdown run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run has produced a tick yet
    Idle,
    /// Tick source active
    Running,
    /// Tick source stopped, elapsed ticks retained
    Paused,
    /// Elapsed ticks reached the duration
    Completed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Completed => "completed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icon the play/pause control should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIcon {
    Play,
    Pause,
}

/// Result of applying one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Elapsed ticks advanced, the run goes on
    Advanced,
    /// Elapsed ticks reached the duration, the run is over
    Completed,
}

/// Mutable countdown state. Everything shown to the user is derived from
/// these three fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub duration_seconds: u32,
    pub elapsed_ticks: u32,
    pub run_state: RunState,
}

impl TimerState {
    /// Create an idle timer for the given duration
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            duration_seconds,
            elapsed_ticks: 0,
            run_state: RunState::Idle,
        }
    }

    /// Fraction of the duration elapsed, in [0, 1]. A zero duration counts as
    /// already finished.
    pub fn progress(&self) -> f32 {
        if self.duration_seconds == 0 {
            return 1.0;
        }
        let ratio = self.elapsed_ticks as f32 / self.duration_seconds as f32;
        ratio.min(1.0)
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.duration_seconds.saturating_sub(self.elapsed_ticks)
    }

    /// Remaining time as `"1m 5s"`, or `"5s"` under a minute
    pub fn display_text(&self) -> String {
        format_remaining(self.remaining_seconds())
    }

    /// Duration edits are locked once a run has ticked at least once
    pub fn edit_locked(&self) -> bool {
        self.elapsed_ticks > 0
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn action_icon(&self) -> ActionIcon {
        if self.is_running() {
            ActionIcon::Pause
        } else {
            ActionIcon::Play
        }
    }

    /// Replace the duration and rewind to the start of a run
    pub fn set_duration(&mut self, duration_seconds: u32) {
        self.duration_seconds = duration_seconds;
        self.elapsed_ticks = 0;
        self.run_state = RunState::Idle;
    }

    /// Clear elapsed ticks without touching the run state
    pub fn rewind(&mut self) {
        self.elapsed_ticks = 0;
    }

    /// Advance by one tick
    pub fn tick(&mut self) -> TickOutcome {
        if self.elapsed_ticks < self.duration_seconds {
            self.elapsed_ticks += 1;
        }
        if self.elapsed_ticks >= self.duration_seconds {
            self.run_state = RunState::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }

    /// Immutable view handed to observers
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            duration_seconds: self.duration_seconds,
            duration_text: self.duration_seconds.to_string(),
            elapsed_ticks: self.elapsed_ticks,
            remaining_seconds: self.remaining_seconds(),
            run_state: self.run_state,
            progress: self.progress(),
            display_text: self.display_text(),
            edit_locked: self.edit_locked(),
            action_icon: self.action_icon(),
        }
    }
}

/// Everything the presentation layer renders for one timer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub duration_seconds: u32,
    /// Duration as it should appear in the input field
    pub duration_text: String,
    pub elapsed_ticks: u32,
    pub remaining_seconds: u32,
    pub run_state: RunState,
    pub progress: f32,
    pub display_text: String,
    pub edit_locked: bool,
    pub action_icon: ActionIcon,
}

/// Format a number of seconds the way the remaining-time label shows it
pub fn format_remaining(remaining_seconds: u32) -> String {
    let minutes = remaining_seconds / 60;
    let seconds = remaining_seconds % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
