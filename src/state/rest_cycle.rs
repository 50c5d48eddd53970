//! Rest-between-sets cycle: prompt, countdown, over-tick

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::SessionError;
use crate::utils::format;

/// Period of every rest and stopwatch tick
pub const TICK: Duration = Duration::from_secs(1);

/// Where the rest cycle currently is.
///
/// `Counting` holds `remaining_seconds == 0` for the instant between the
/// countdown running out and the first over-tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestPhase {
    Idle,
    Prompt {
        set_index: usize,
    },
    Counting {
        set_index: usize,
        target_seconds: u64,
        remaining_seconds: u64,
        actual_seconds: u64,
        started_at: Instant,
    },
    Overticking {
        set_index: usize,
        target_seconds: u64,
        overtick_seconds: u64,
        actual_seconds: u64,
        started_at: Instant,
    },
}

impl RestPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RestPhase::Idle => "idle",
            RestPhase::Prompt { .. } => "prompt",
            RestPhase::Counting { .. } => "counting",
            RestPhase::Overticking { .. } => "overticking",
        }
    }
}

/// A rest that ran and was ended by the user, ready to be logged against its set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRest {
    pub set_index: usize,
    pub actual_seconds: u64,
}

/// Serializable view of the rest cycle for watchers and the HTTP status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSnapshot {
    pub phase: String,
    pub set_index: Option<usize>,
    pub target_seconds: u64,
    pub remaining_seconds: u64,
    pub overtick_seconds: u64,
    pub actual_seconds: u64,
    pub next_duration_seconds: u64,
    pub display: String,
}

/// Single-instance rest state for one workout session
#[derive(Debug, Clone)]
pub struct RestCycle {
    phase: RestPhase,
    next_duration_seconds: u64,
}

impl RestCycle {
    pub fn new(next_duration_seconds: u64) -> Self {
        Self {
            phase: RestPhase::Idle,
            next_duration_seconds,
        }
    }

    pub fn phase(&self) -> &RestPhase {
        &self.phase
    }

    /// True while a rest is counting down or over-ticking
    pub fn is_counting(&self) -> bool {
        matches!(
            self.phase,
            RestPhase::Counting { .. } | RestPhase::Overticking { .. }
        )
    }

    pub fn is_idle(&self) -> bool {
        self.phase == RestPhase::Idle
    }

    pub fn set_index(&self) -> Option<usize> {
        match self.phase {
            RestPhase::Idle => None,
            RestPhase::Prompt { set_index }
            | RestPhase::Counting { set_index, .. }
            | RestPhase::Overticking { set_index, .. } => Some(set_index),
        }
    }

    pub fn next_duration_seconds(&self) -> u64 {
        self.next_duration_seconds
    }

    pub fn target_duration_seconds(&self) -> u64 {
        match self.phase {
            RestPhase::Counting { target_seconds, .. }
            | RestPhase::Overticking { target_seconds, .. } => target_seconds,
            _ => 0,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        match self.phase {
            RestPhase::Counting {
                remaining_seconds, ..
            } => remaining_seconds,
            _ => 0,
        }
    }

    pub fn overtick_seconds(&self) -> u64 {
        match self.phase {
            RestPhase::Overticking {
                overtick_seconds, ..
            } => overtick_seconds,
            _ => 0,
        }
    }

    pub fn actual_elapsed_seconds(&self) -> u64 {
        match self.phase {
            RestPhase::Counting { actual_seconds, .. }
            | RestPhase::Overticking { actual_seconds, .. } => actual_seconds,
            _ => 0,
        }
    }

    /// Open the rest prompt for a just-completed set, dropping any earlier rest
    pub fn prepare_rest(&mut self, set_index: usize, default_duration_seconds: u64) {
        if !self.is_idle() {
            debug!(
                "Replacing {} rest for set {:?} with prompt for set {}",
                self.phase.name(),
                self.set_index(),
                set_index
            );
        }
        self.phase = RestPhase::Prompt { set_index };
        self.next_duration_seconds = default_duration_seconds;
    }

    /// Begin counting down from the configured next duration
    pub fn start_rest(&mut self) -> Result<(), SessionError> {
        self.start_rest_at(Instant::now())
    }

    pub fn start_rest_at(&mut self, now: Instant) -> Result<(), SessionError> {
        let RestPhase::Prompt { set_index } = self.phase else {
            return Err(SessionError::InvalidTransition {
                action: "start rest",
                phase: self.phase.name(),
            });
        };

        self.phase = RestPhase::Counting {
            set_index,
            target_seconds: self.next_duration_seconds,
            remaining_seconds: self.next_duration_seconds,
            actual_seconds: 0,
            started_at: now,
        };
        Ok(())
    }

    /// Apply one second of rest: one countdown (or over-tick) step and one
    /// actual-time step
    pub fn tick(&mut self) {
        self.phase = match self.phase {
            RestPhase::Counting {
                set_index,
                target_seconds,
                remaining_seconds: 0,
                actual_seconds,
                started_at,
            } => RestPhase::Overticking {
                set_index,
                target_seconds,
                overtick_seconds: 1,
                actual_seconds: actual_seconds + 1,
                started_at,
            },
            RestPhase::Counting {
                set_index,
                target_seconds,
                remaining_seconds,
                actual_seconds,
                started_at,
            } => RestPhase::Counting {
                set_index,
                target_seconds,
                remaining_seconds: remaining_seconds - 1,
                actual_seconds: actual_seconds + 1,
                started_at,
            },
            RestPhase::Overticking {
                set_index,
                target_seconds,
                overtick_seconds,
                actual_seconds,
                started_at,
            } => RestPhase::Overticking {
                set_index,
                target_seconds,
                overtick_seconds: overtick_seconds + 1,
                actual_seconds: actual_seconds + 1,
                started_at,
            },
            RestPhase::Idle | RestPhase::Prompt { .. } => return,
        };
    }

    /// Catch the rest up to `now`, replaying every whole second that passed
    /// since it started. Late or missed ticks therefore never under-count, and
    /// an earlier `now` changes nothing.
    pub fn advance_to(&mut self, now: Instant) {
        let started_at = match self.phase {
            RestPhase::Counting { started_at, .. } | RestPhase::Overticking { started_at, .. } => {
                started_at
            }
            _ => return,
        };

        let due = now.saturating_duration_since(started_at).as_secs();
        let behind = due.saturating_sub(self.actual_elapsed_seconds());
        if behind > 1 {
            debug!("Rest catching up {} missed seconds", behind - 1);
        }
        for _ in 0..behind {
            self.tick();
        }
    }

    /// End the rest. Returns what was actually taken when a rest was counting;
    /// a bare prompt or an idle cycle yields nothing. Always leaves the cycle idle.
    pub fn stop_rest(&mut self) -> Option<CompletedRest> {
        self.stop_rest_at(Instant::now())
    }

    pub fn stop_rest_at(&mut self, now: Instant) -> Option<CompletedRest> {
        self.advance_to(now);

        let completed = match self.phase {
            RestPhase::Counting {
                set_index,
                actual_seconds,
                ..
            }
            | RestPhase::Overticking {
                set_index,
                actual_seconds,
                ..
            } => Some(CompletedRest {
                set_index,
                actual_seconds,
            }),
            _ => None,
        };

        self.phase = RestPhase::Idle;
        completed
    }

    /// Drop back to idle without reporting anything
    pub fn clear_rest_state(&mut self) {
        self.phase = RestPhase::Idle;
    }

    /// Change the duration of the next rest, floored at zero
    pub fn adjust_duration(&mut self, delta_seconds: i64) -> u64 {
        self.next_duration_seconds = self
            .next_duration_seconds
            .saturating_add_signed(delta_seconds);
        self.next_duration_seconds
    }

    /// Seed the next rest's duration without touching the current phase
    pub fn set_next_duration(&mut self, seconds: u64) {
        self.next_duration_seconds = seconds;
    }

    /// Countdown face, or `+M:SS` once the target has been passed
    pub fn remaining_display(&self) -> String {
        match self.phase {
            RestPhase::Overticking {
                overtick_seconds, ..
            } => format!("+{}", format::clock(overtick_seconds)),
            RestPhase::Counting {
                remaining_seconds, ..
            } => format::clock(remaining_seconds),
            _ => format::clock(self.next_duration_seconds),
        }
    }

    pub fn next_duration_display(&self) -> String {
        format::minutes_seconds(self.next_duration_seconds)
    }

    pub fn snapshot(&self) -> RestSnapshot {
        RestSnapshot {
            phase: self.phase.name().to_string(),
            set_index: self.set_index(),
            target_seconds: self.target_duration_seconds(),
            remaining_seconds: self.remaining_seconds(),
            overtick_seconds: self.overtick_seconds(),
            actual_seconds: self.actual_elapsed_seconds(),
            next_duration_seconds: self.next_duration_seconds,
            display: self.remaining_display(),
        }
    }

    /// Start of the running rest, used to align the rest ticker
    pub(crate) fn started_at(&self) -> Option<Instant> {
        match self.phase {
            RestPhase::Counting { started_at, .. } | RestPhase::Overticking { started_at, .. } => {
                Some(started_at)
            }
            _ => None,
        }
    }
}

impl Default for RestCycle {
    fn default() -> Self {
        Self::new(90)
    }
}
