//! Workout session orchestration
//!
//! `WorkoutSession` is the only owner of the session stopwatch and the rest
//! cycle. Every user-facing event goes through one of its methods, which apply
//! the paired transitions (pause with prompt, resume with rest end) under a
//! single lock and keep the periodic tickers in step with the new state.

use std::sync::{Arc, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, warn};

use super::{
    rest_cycle::{RestCycle, RestSnapshot, TICK},
    stopwatch::WorkoutStopwatch,
};
use crate::{
    error::SessionError,
    services::{ElapsedStore, ExerciseNavigation, Navigator, RestRecorder},
    tasks::{auto_advance_task, Ticker},
    utils::format,
};

/// Rest taken after a set, as handed to the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRecord {
    pub exercise_index: usize,
    pub set_index: usize,
    pub actual_seconds: u64,
}

/// Notifications broadcast to session watchers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SetCompleted { exercise_index: usize, set_index: usize },
    SetUncompleted { set_index: usize },
    /// Every set of the exercise is done and another exercise follows
    ExerciseCompleted { exercise_index: usize },
    RestStarted { set_index: usize, target_seconds: u64 },
    RestTargetReached { set_index: usize },
    RestRecorded(RestRecord),
    RestCleared,
    ExerciseChanged { exercise_index: usize, next_rest_seconds: u64 },
    StopwatchToggled { running: bool },
    StopwatchReset,
    Finished { elapsed_seconds: u64 },
    Abandoned,
}

/// Point-in-time view of the whole session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub stopwatch_running: bool,
    pub rest: RestSnapshot,
    pub rest_exercise: Option<usize>,
    pub navigation_locked: bool,
    pub ended: bool,
}

#[derive(Debug)]
struct SessionCore {
    stopwatch: WorkoutStopwatch,
    rest: RestCycle,
    /// Exercise the pending or running rest belongs to
    rest_exercise: Option<usize>,
    ended: bool,
}

impl SessionCore {
    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.ended {
            Err(SessionError::Ended)
        } else {
            Ok(())
        }
    }

    fn locks_navigation(&self, current_exercise: usize) -> bool {
        !self.rest.is_idle() && self.rest_exercise.map_or(true, |ex| ex == current_exercise)
    }
}

#[derive(Debug, Default)]
struct SessionTasks {
    stopwatch: Option<Ticker>,
    rest: Option<Ticker>,
    auto_advance: Option<JoinHandle<()>>,
}

impl SessionTasks {
    fn cancel_all(&mut self) {
        self.stopwatch = None;
        self.rest = None;
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
        }
    }
}

fn lock(core: &Mutex<SessionCore>) -> MutexGuard<'_, SessionCore> {
    core.lock().unwrap_or_else(|e| e.into_inner())
}

/// Coordinates the session stopwatch with the rest cycle
pub struct WorkoutSession {
    core: Arc<Mutex<SessionCore>>,
    tasks: Mutex<SessionTasks>,
    navigator: Arc<dyn Navigator>,
    recorder: Arc<dyn RestRecorder>,
    store: Arc<dyn ElapsedStore>,
    elapsed_tx: Arc<watch::Sender<u64>>,
    rest_tx: Arc<watch::Sender<RestSnapshot>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl WorkoutSession {
    /// Begin a session, resuming a persisted one if the store has it.
    ///
    /// A restored session starts paused at the persisted value; a new one
    /// starts running from zero. Must be called inside a tokio runtime.
    pub fn start(
        navigator: Arc<dyn Navigator>,
        recorder: Arc<dyn RestRecorder>,
        store: Arc<dyn ElapsedStore>,
    ) -> Arc<Self> {
        let now = Instant::now();
        let (initial, auto_start) = match store.restore_elapsed() {
            Ok(Some(seconds)) => {
                info!("Resuming workout session at {}s (paused)", seconds);
                (seconds, false)
            }
            Ok(None) => {
                info!("Starting new workout session");
                (0, true)
            }
            Err(e) => {
                warn!("Failed to restore session, starting fresh: {}", e);
                (0, true)
            }
        };

        let core = SessionCore {
            stopwatch: WorkoutStopwatch::start_at(initial, auto_start, now),
            rest: RestCycle::new(navigator.current_exercise_rest().1),
            rest_exercise: None,
            ended: false,
        };
        let (elapsed_tx, _) = watch::channel(initial);
        let (rest_tx, _) = watch::channel(core.rest.snapshot());
        let (event_tx, events) = broadcast::channel(64);

        let session = Arc::new(Self {
            core: Arc::new(Mutex::new(core)),
            tasks: Mutex::new(SessionTasks::default()),
            navigator,
            recorder,
            store,
            elapsed_tx: Arc::new(elapsed_tx),
            rest_tx: Arc::new(rest_tx),
            event_tx,
        });

        let handle = tokio::spawn(auto_advance_task(Arc::downgrade(&session), events));
        {
            let core = lock(&session.core);
            let mut tasks = session.tasks();
            tasks.auto_advance = Some(handle);
            session.sync_tickers(&core, &mut tasks, now);
        }

        session
    }

    fn core(&self) -> MutexGuard<'_, SessionCore> {
        lock(&self.core)
    }

    fn tasks(&self) -> MutexGuard<'_, SessionTasks> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No session event listeners");
        }
    }

    /// Publish fresh values and make the tickers match the state: a stopwatch
    /// ticker exactly while it runs, a rest ticker exactly while rest counts.
    /// Callers hold the core lock, so the lock order is always core, then tasks.
    fn sync_tickers(&self, core: &SessionCore, tasks: &mut SessionTasks, now: Instant) {
        self.elapsed_tx
            .send_replace(core.stopwatch.current_elapsed_seconds_at(now));
        self.rest_tx.send_replace(core.rest.snapshot());

        if core.ended {
            tasks.cancel_all();
            return;
        }

        match (core.stopwatch.is_running(), tasks.stopwatch.is_some()) {
            (true, false) => tasks.stopwatch = Some(self.spawn_stopwatch_ticker(now)),
            (false, true) => tasks.stopwatch = None,
            _ => {}
        }

        match (core.rest.started_at(), tasks.rest.is_some()) {
            (Some(started_at), false) => tasks.rest = Some(self.spawn_rest_ticker(started_at)),
            (None, true) => tasks.rest = None,
            _ => {}
        }
    }

    fn spawn_stopwatch_ticker(&self, anchor: Instant) -> Ticker {
        let core = Arc::clone(&self.core);
        let elapsed_tx = Arc::clone(&self.elapsed_tx);

        Ticker::spawn("stopwatch", anchor, TICK, move |now| {
            let elapsed = lock(&core).stopwatch.current_elapsed_seconds_at(now);
            elapsed_tx.send_replace(elapsed);
        })
    }

    fn spawn_rest_ticker(&self, anchor: Instant) -> Ticker {
        let core = Arc::clone(&self.core);
        let rest_tx = Arc::clone(&self.rest_tx);
        let event_tx = self.event_tx.clone();

        // One ticker per rest, so the flag is per rest too
        let mut announced = false;

        Ticker::spawn("rest", anchor, TICK, move |now| {
            let snapshot = {
                let mut core = lock(&core);
                core.rest.advance_to(now);
                core.rest.snapshot()
            };

            let reached = snapshot.target_seconds > 0
                && snapshot.remaining_seconds == 0
                && snapshot.actual_seconds > 0;
            if reached && !announced {
                announced = true;
                if let Some(set_index) = snapshot.set_index {
                    debug!("Rest target reached for set {}", set_index);
                    if event_tx
                        .send(SessionEvent::RestTargetReached { set_index })
                        .is_err()
                    {
                        debug!("No session event listeners");
                    }
                }
            }
            rest_tx.send_replace(snapshot);
        })
    }

    /// A set was ticked off: freeze the stopwatch and open the rest prompt.
    ///
    /// When the exercise is now complete and another one follows, an
    /// `ExerciseCompleted` event is broadcast and the auto-advance task moves
    /// on after this call has returned.
    pub fn on_set_completed(
        &self,
        set_index: usize,
        exercise_complete: bool,
    ) -> Result<(), SessionError> {
        let (exercise_index, default_rest) = self.navigator.current_exercise_rest();
        let now = Instant::now();

        {
            let mut core = self.core();
            core.ensure_active()?;
            core.stopwatch.pause_at(now);
            core.rest.prepare_rest(set_index, default_rest);
            core.rest_exercise = Some(exercise_index);
            self.sync_tickers(&core, &mut self.tasks(), now);
        }

        info!(
            "Set {} of exercise {} completed, rest prompt open ({}s)",
            set_index, exercise_index, default_rest
        );
        self.emit(SessionEvent::SetCompleted {
            exercise_index,
            set_index,
        });

        if exercise_complete && self.navigator.can_advance_exercise() {
            self.emit(SessionEvent::ExerciseCompleted { exercise_index });
        }
        Ok(())
    }

    /// A set was un-ticked: drop any rest prompt without recording it.
    ///
    /// The stopwatch is deliberately left as it is, even when the dropped
    /// prompt had paused it. It stays paused until toggled or until the next
    /// rest ends.
    pub fn on_set_uncompleted(&self, set_index: usize) -> Result<(), SessionError> {
        let now = Instant::now();
        {
            let mut core = self.core();
            core.ensure_active()?;
            core.rest.clear_rest_state();
            core.rest_exercise = None;
            self.sync_tickers(&core, &mut self.tasks(), now);
        }

        debug!("Set {} uncompleted, rest state cleared", set_index);
        self.emit(SessionEvent::SetUncompleted { set_index });
        Ok(())
    }

    /// Start counting down the prepared rest
    pub fn on_rest_started(&self) -> Result<RestSnapshot, SessionError> {
        let now = Instant::now();
        let snapshot = {
            let mut core = self.core();
            core.ensure_active()?;
            core.rest.start_rest_at(now)?;
            self.sync_tickers(&core, &mut self.tasks(), now);
            core.rest.snapshot()
        };

        if let Some(set_index) = snapshot.set_index {
            info!("Rest started for set {}: {}s", set_index, snapshot.target_seconds);
            self.emit(SessionEvent::RestStarted {
                set_index,
                target_seconds: snapshot.target_seconds,
            });
        }
        Ok(snapshot)
    }

    /// End the rest and resume the stopwatch. A rest that was actually
    /// counting is recorded against its set and returned. Ending when no rest
    /// is pending does nothing.
    pub fn on_rest_ended(&self) -> Result<Option<RestRecord>, SessionError> {
        let now = Instant::now();
        let record = {
            let mut core = self.core();
            core.ensure_active()?;
            if core.rest.is_idle() {
                debug!("Rest end requested with no rest pending");
                return Ok(None);
            }

            let completed = core.rest.stop_rest_at(now);
            let exercise_index = core.rest_exercise.take();
            core.stopwatch.resume_at(now);
            self.sync_tickers(&core, &mut self.tasks(), now);

            completed.zip(exercise_index).map(|(rest, exercise_index)| RestRecord {
                exercise_index,
                set_index: rest.set_index,
                actual_seconds: rest.actual_seconds,
            })
        };

        match record {
            Some(record) => {
                info!(
                    "Rest ended after {} for set {}",
                    format::minutes_seconds(record.actual_seconds),
                    record.set_index
                );
                self.recorder.record_rest(
                    record.exercise_index,
                    record.set_index,
                    record.actual_seconds,
                );
                self.emit(SessionEvent::RestRecorded(record));
            }
            None => {
                debug!("Rest prompt dismissed without resting");
                self.emit(SessionEvent::RestCleared);
            }
        }
        Ok(record)
    }

    /// Lengthen or shorten the next rest. Returns the new duration.
    pub fn adjust_rest(&self, delta_seconds: i64) -> Result<u64, SessionError> {
        let mut core = self.core();
        core.ensure_active()?;
        let next = core.rest.adjust_duration(delta_seconds);
        self.rest_tx.send_replace(core.rest.snapshot());
        debug!("Next rest adjusted by {}s to {}s", delta_seconds, next);
        Ok(next)
    }

    /// Manual exercise navigation.
    ///
    /// Refused while a rest for the current exercise is pending or counting. A
    /// rest carried over from a previous exercise is dropped unrecorded and the
    /// stopwatch resumes. Returns the new exercise's default rest, or `None`
    /// when there is nowhere to go.
    pub fn on_exercise_navigated(
        &self,
        navigation: ExerciseNavigation,
    ) -> Result<Option<u64>, SessionError> {
        let current = self.navigator.current_exercise();
        let now = Instant::now();

        {
            let mut core = self.core();
            core.ensure_active()?;
            if core.locks_navigation(current) {
                return Err(SessionError::RestInProgress {
                    phase: core.rest.phase().name(),
                });
            }

            if !core.rest.is_idle() {
                debug!("Dropping rest carried over from exercise {:?}", core.rest_exercise);
                core.stopwatch.resume_at(now);
            }
            core.rest.clear_rest_state();
            core.rest_exercise = None;
            self.sync_tickers(&core, &mut self.tasks(), now);
        }

        let next_rest = self.navigator.navigate(navigation);
        match next_rest {
            Some(seconds) => self.seed_next_rest(seconds),
            None => debug!("Navigation {:?} had no target", navigation),
        }
        Ok(next_rest)
    }

    /// Move past an exercise whose sets are all complete. Runs from the
    /// auto-advance task; the rest prompt and the paused stopwatch are kept.
    pub fn auto_advance(&self, completed_exercise: usize) {
        if self.is_ended() {
            return;
        }
        if self.navigator.current_exercise() != completed_exercise {
            debug!(
                "Skipping auto-advance, exercise {} is no longer current",
                completed_exercise
            );
            return;
        }
        if !self.navigator.is_exercise_complete(completed_exercise) {
            debug!(
                "Skipping auto-advance, exercise {} has an open set again",
                completed_exercise
            );
            return;
        }

        match self.navigator.advance_exercise() {
            Some(seconds) => {
                info!("Exercise {} complete, advancing", completed_exercise);
                self.seed_next_rest(seconds);
            }
            None => debug!("No exercise after {}", completed_exercise),
        }
    }

    fn seed_next_rest(&self, seconds: u64) {
        let exercise_index = self.navigator.current_exercise();
        {
            let mut core = self.core();
            core.rest.set_next_duration(seconds);
            self.rest_tx.send_replace(core.rest.snapshot());
        }
        self.emit(SessionEvent::ExerciseChanged {
            exercise_index,
            next_rest_seconds: seconds,
        });
    }

    /// Pause or resume the stopwatch by hand. Returns whether it now runs.
    ///
    /// Refused while a rest prompt is open or a rest is counting, since the
    /// workout clock stays frozen until that rest ends.
    pub fn toggle_stopwatch(&self) -> Result<bool, SessionError> {
        let now = Instant::now();
        let running = {
            let mut core = self.core();
            core.ensure_active()?;
            if !core.rest.is_idle() {
                return Err(SessionError::InvalidTransition {
                    action: "toggle stopwatch",
                    phase: core.rest.phase().name(),
                });
            }
            core.stopwatch.toggle_at(now);
            self.sync_tickers(&core, &mut self.tasks(), now);
            core.stopwatch.is_running()
        };

        info!("Stopwatch {}", if running { "resumed" } else { "paused" });
        self.emit(SessionEvent::StopwatchToggled { running });
        Ok(running)
    }

    pub fn reset_stopwatch(&self) -> Result<(), SessionError> {
        let now = Instant::now();
        {
            let mut core = self.core();
            core.ensure_active()?;
            core.stopwatch.reset_at(now);
            self.sync_tickers(&core, &mut self.tasks(), now);
        }

        info!("Stopwatch reset");
        self.emit(SessionEvent::StopwatchReset);
        Ok(())
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.core().stopwatch.current_elapsed_seconds()
    }

    pub fn is_stopwatch_running(&self) -> bool {
        self.core().stopwatch.is_running()
    }

    /// Current rest state, caught up to the wall clock
    pub fn rest(&self) -> RestSnapshot {
        let mut core = self.core();
        core.rest.advance_to(Instant::now());
        core.rest.snapshot()
    }

    pub fn is_navigation_locked(&self) -> bool {
        let current = self.navigator.current_exercise();
        self.core().locks_navigation(current)
    }

    pub fn is_ended(&self) -> bool {
        self.core().ended
    }

    pub fn status(&self) -> SessionStatus {
        let current = self.navigator.current_exercise();
        let now = Instant::now();
        let mut core = self.core();
        core.rest.advance_to(now);

        let elapsed_seconds = core.stopwatch.current_elapsed_seconds_at(now);
        SessionStatus {
            elapsed_seconds,
            elapsed_display: format::clock(elapsed_seconds),
            stopwatch_running: core.stopwatch.is_running(),
            rest: core.rest.snapshot(),
            rest_exercise: core.rest_exercise,
            navigation_locked: core.locks_navigation(current),
            ended: core.ended,
        }
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }

    pub fn subscribe_rest(&self) -> watch::Receiver<RestSnapshot> {
        self.rest_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Hand the current elapsed value to the store. Store failures are logged
    /// and swallowed. Returns the value that was persisted.
    pub fn snapshot(&self) -> u64 {
        let (elapsed, ended) = {
            let core = self.core();
            (core.stopwatch.current_elapsed_seconds(), core.ended)
        };
        if ended {
            debug!("Session ended, skipping snapshot");
            return elapsed;
        }

        if let Err(e) = self.store.persist_elapsed(elapsed) {
            warn!("Failed to persist session elapsed time: {}", e);
        }
        elapsed
    }

    /// End the session normally. Returns the final workout duration.
    pub fn finish(&self) -> Result<u64, SessionError> {
        let elapsed = self.end(Instant::now())?;
        info!("Workout finished after {}", format::hours_minutes(elapsed));
        self.emit(SessionEvent::Finished {
            elapsed_seconds: elapsed,
        });
        Ok(elapsed)
    }

    /// Throw the session away without a final duration
    pub fn abandon(&self) -> Result<(), SessionError> {
        self.end(Instant::now())?;
        info!("Workout abandoned");
        self.emit(SessionEvent::Abandoned);
        Ok(())
    }

    fn end(&self, now: Instant) -> Result<u64, SessionError> {
        let elapsed = {
            let mut core = self.core();
            core.ensure_active()?;
            core.stopwatch.pause_at(now);
            core.rest.clear_rest_state();
            core.rest_exercise = None;
            core.ended = true;
            self.sync_tickers(&core, &mut self.tasks(), now);
            core.stopwatch.current_elapsed_seconds_at(now)
        };

        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
        Ok(elapsed)
    }
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("core", &*self.core())
            .finish_non_exhaustive()
    }
}

impl Drop for WorkoutSession {
    fn drop(&mut self) {
        self.tasks().cancel_all();
    }
}
