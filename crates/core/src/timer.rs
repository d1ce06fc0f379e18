//! Countdown state machine for a timed attempt.
//!
//! `Countdown` knows nothing about wall-clock scheduling: a driver calls
//! [`Countdown::tick`] once per second and reacts to the returned outcome.

use serde::{Deserialize, Serialize};

/// Why a countdown stopped with a completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    TimeExpired,
    FinishedEarly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Completed(CompletionReason),
    /// Abandoned before completion; no signal was emitted.
    Cancelled,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    /// Emitted exactly once, on the tick that reaches zero.
    Completed(CompletionReason),
    /// The countdown already stopped; nothing changed.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_seconds: u32,
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    #[must_use]
    pub fn new(total_seconds: u32) -> Self {
        Self {
            total_seconds,
            remaining: total_seconds,
            state: CountdownState::Running,
        }
    }

    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(minutes.saturating_mul(60))
    }

    /// Advance by one second.
    ///
    /// The tick that moves the countdown to zero returns `Completed`; every
    /// tick after that (or after `finish_now` / `cancel`) returns `Idle`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != CountdownState::Running {
            return TickOutcome::Idle;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.state = CountdownState::Completed(CompletionReason::TimeExpired);
            return TickOutcome::Completed(CompletionReason::TimeExpired);
        }
        self.remaining -= 1;
        TickOutcome::Running {
            remaining: self.remaining,
        }
    }

    /// Stop immediately and signal completion.
    ///
    /// Returns `None` if the countdown had already stopped.
    pub fn finish_now(&mut self) -> Option<CompletionReason> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.state = CountdownState::Completed(CompletionReason::FinishedEarly);
        Some(CompletionReason::FinishedEarly)
    }

    /// Stop without a completion signal. Returns `true` if this call stopped it.
    pub fn cancel(&mut self) -> bool {
        if self.state != CountdownState::Running {
            return false;
        }
        self.state = CountdownState::Cancelled;
        true
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.total_seconds - self.remaining
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining)
    }
}

/// Render seconds as `minutes:seconds` with two-digit seconds (90 -> "1:30").
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
