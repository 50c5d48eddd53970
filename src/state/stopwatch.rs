//! Workout stopwatch: cumulative session time with pause/resume

use std::time::Duration;
use tokio::time::Instant;

/// Elapsed time for a whole workout session.
///
/// Time is derived from the wall clock at read time, never from counting ticks,
/// so a process that was suspended for minutes catches up on the next read.
/// `last_resume` is `Some` exactly while the stopwatch runs.
#[derive(Debug, Clone)]
pub struct WorkoutStopwatch {
    accumulated: Duration,
    last_resume: Option<Instant>,
}

impl WorkoutStopwatch {
    /// Create a stopwatch seeded with previously accumulated seconds
    pub fn start(initial_accumulated_seconds: u64, auto_start: bool) -> Self {
        Self::start_at(initial_accumulated_seconds, auto_start, Instant::now())
    }

    pub fn start_at(initial_accumulated_seconds: u64, auto_start: bool, now: Instant) -> Self {
        Self {
            accumulated: Duration::from_secs(initial_accumulated_seconds),
            last_resume: auto_start.then_some(now),
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_resume.is_some()
    }

    /// Freeze the elapsed value. No-op when already paused.
    pub fn pause(&mut self) {
        self.pause_at(Instant::now())
    }

    pub fn pause_at(&mut self, now: Instant) {
        if let Some(resumed) = self.last_resume.take() {
            self.accumulated += now.saturating_duration_since(resumed);
        }
    }

    /// Start a new running segment. No-op when already running.
    pub fn resume(&mut self) {
        self.resume_at(Instant::now())
    }

    pub fn resume_at(&mut self, now: Instant) {
        if self.last_resume.is_none() {
            self.last_resume = Some(now);
        }
    }

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now())
    }

    pub fn toggle_at(&mut self, now: Instant) {
        if self.is_running() {
            self.pause_at(now);
        } else {
            self.resume_at(now);
        }
    }

    /// Zero the stopwatch, keeping its running/paused mode
    pub fn reset(&mut self) {
        self.reset_at(Instant::now())
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        if self.last_resume.is_some() {
            self.last_resume = Some(now);
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.last_resume {
            Some(resumed) => self.accumulated + now.saturating_duration_since(resumed),
            None => self.accumulated,
        }
    }

    /// Whole elapsed seconds right now, without touching state
    pub fn current_elapsed_seconds(&self) -> u64 {
        self.current_elapsed_seconds_at(Instant::now())
    }

    pub fn current_elapsed_seconds_at(&self, now: Instant) -> u64 {
        self.elapsed_at(now).as_secs()
    }
}

impl Default for WorkoutStopwatch {
    fn default() -> Self {
        Self {
            accumulated: Duration::ZERO,
            last_resume: None,
        }
    }
}
