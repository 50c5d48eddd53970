use std::{sync::Arc, time::Duration};
use tokio::time::advance;
use workout_timer::{
    error::SessionError,
    services::{
        plan::PlannedExercise, ExerciseNavigation, MemoryStore, Navigator, PlanTracker,
        WorkoutPlan,
    },
    state::{RestRecord, SessionEvent, WorkoutSession},
};

// Squat rests 20s between its two sets, bench 60s
fn test_plan() -> Arc<PlanTracker> {
    let plan = WorkoutPlan {
        name: "Test Day".to_string(),
        exercises: vec![
            PlannedExercise::new("Squat", 2, 20),
            PlannedExercise::new("Bench Press", 2, 60),
        ],
    };
    Arc::new(PlanTracker::new(plan).expect("plan has exercises"))
}

fn start_session(store: Arc<MemoryStore>) -> (Arc<WorkoutSession>, Arc<PlanTracker>) {
    let plan = test_plan();
    let session = WorkoutSession::start(plan.clone(), plan.clone(), store);
    (session, plan)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// Let spawned tasks (tickers, auto-advance) run without moving the clock
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn complete(session: &WorkoutSession, plan: &PlanTracker, set_index: usize) {
    let exercise_complete = plan.complete_set(set_index).unwrap();
    session.on_set_completed(set_index, exercise_complete).unwrap();
}

#[tokio::test(start_paused = true)]
async fn rest_freezes_and_resumes_the_workout_clock() {
    let store = Arc::new(MemoryStore::new());
    let (session, plan) = start_session(store);
    assert!(session.is_stopwatch_running());

    advance(secs(10)).await;
    assert_eq!(session.elapsed_seconds(), 10);

    complete(&session, &plan, 0);
    assert!(!session.is_stopwatch_running());
    advance(secs(30)).await;
    assert_eq!(session.elapsed_seconds(), 10);

    let rest = session.on_rest_started().unwrap();
    assert_eq!(rest.target_seconds, 20);

    advance(secs(20)).await;
    let rest = session.rest();
    assert_eq!(rest.remaining_seconds, 0);
    assert_eq!(rest.actual_seconds, 20);
    assert_eq!(session.elapsed_seconds(), 10);

    let record = session.on_rest_ended().unwrap();
    assert_eq!(
        record,
        Some(RestRecord {
            exercise_index: 0,
            set_index: 0,
            actual_seconds: 20
        })
    );
    assert!(session.is_stopwatch_running());
    assert_eq!(session.elapsed_seconds(), 10);
    assert_eq!(plan.recorded_rest(0, 0), Some(20));

    advance(secs(5)).await;
    assert_eq!(session.elapsed_seconds(), 15);
}

#[tokio::test(start_paused = true)]
async fn overtick_is_recorded_as_actual_rest() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));
    plan.navigate(ExerciseNavigation::Select(1));

    complete(&session, &plan, 0);
    session.on_rest_started().unwrap();

    advance(secs(45)).await;
    let rest = session.rest();
    assert_eq!((rest.remaining_seconds, rest.overtick_seconds, rest.actual_seconds), (15, 0, 45));

    advance(secs(30)).await;
    let rest = session.rest();
    assert_eq!(rest.phase, "overticking");
    assert_eq!((rest.remaining_seconds, rest.overtick_seconds, rest.actual_seconds), (0, 15, 75));

    let record = session.on_rest_ended().unwrap().unwrap();
    assert_eq!(record.actual_seconds, 75);
    assert_eq!(plan.recorded_rest(1, 0), Some(75));

    // A second stop has nothing left to report
    assert_eq!(session.on_rest_ended().unwrap(), None);
    assert_eq!(session.rest().phase, "idle");
}

#[tokio::test(start_paused = true)]
async fn undoing_a_set_clears_rest_without_recording_or_resuming() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));
    let mut events = session.subscribe_events();

    complete(&session, &plan, 0);
    session.on_rest_started().unwrap();
    advance(secs(75)).await;

    plan.uncomplete_set(0).unwrap();
    session.on_set_uncompleted(0).unwrap();

    assert_eq!(session.rest().phase, "idle");
    assert_eq!(plan.recorded_rest(0, 0), None);
    // Known asymmetry: the pause taken for the rest is not undone
    assert!(!session.is_stopwatch_running());

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SessionEvent::RestRecorded(_)));
    }
}

#[tokio::test(start_paused = true)]
async fn manual_toggle_is_refused_while_resting() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    advance(secs(10)).await;
    complete(&session, &plan, 0);
    assert_eq!(
        session.toggle_stopwatch(),
        Err(SessionError::InvalidTransition {
            action: "toggle stopwatch",
            phase: "prompt"
        })
    );

    session.on_rest_started().unwrap();
    let err = session.toggle_stopwatch().unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { phase: "counting", .. }));

    advance(secs(30)).await;
    assert!(!session.is_stopwatch_running());
    assert_eq!(session.elapsed_seconds(), 10);

    session.on_rest_ended().unwrap();
    assert!(session.is_stopwatch_running());
    assert!(!session.toggle_stopwatch().unwrap());
    assert_eq!(session.elapsed_seconds(), 10);
}

#[tokio::test(start_paused = true)]
async fn dismissing_prompt_resumes_without_record() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    advance(secs(8)).await;

    assert_eq!(session.on_rest_ended().unwrap(), None);
    assert!(session.is_stopwatch_running());
    assert_eq!(plan.recorded_rest(0, 0), None);
}

#[tokio::test(start_paused = true)]
async fn ending_rest_when_idle_leaves_stopwatch_alone() {
    let (session, _plan) = start_session(Arc::new(MemoryStore::new()));

    advance(secs(4)).await;
    assert!(!session.toggle_stopwatch().unwrap());

    assert_eq!(session.on_rest_ended().unwrap(), None);
    assert!(!session.is_stopwatch_running());
    advance(secs(10)).await;
    assert_eq!(session.elapsed_seconds(), 4);
}

#[tokio::test(start_paused = true)]
async fn starting_rest_without_prompt_is_rejected() {
    let (session, _plan) = start_session(Arc::new(MemoryStore::new()));

    let err = session.on_rest_started().unwrap_err();

    assert!(matches!(err, SessionError::InvalidTransition { phase: "idle", .. }));
    assert!(session.is_stopwatch_running());
}

#[tokio::test(start_paused = true)]
async fn navigation_locked_during_rest_for_current_exercise() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    assert!(session.is_navigation_locked());
    assert!(matches!(
        session.on_exercise_navigated(ExerciseNavigation::Next),
        Err(SessionError::RestInProgress { phase: "prompt" })
    ));

    session.on_rest_started().unwrap();
    assert!(matches!(
        session.on_exercise_navigated(ExerciseNavigation::Select(1)),
        Err(SessionError::RestInProgress { phase: "counting" })
    ));

    advance(secs(20)).await;
    session.on_rest_ended().unwrap();
    assert!(!session.is_navigation_locked());

    let next_rest = session
        .on_exercise_navigated(ExerciseNavigation::Next)
        .unwrap();
    assert_eq!(next_rest, Some(60));
    assert_eq!(plan.current_exercise(), 1);
    assert_eq!(session.rest().next_duration_seconds, 60);

    assert_eq!(
        session.on_exercise_navigated(ExerciseNavigation::Next).unwrap(),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn finishing_an_exercise_advances_after_the_prompt_opens() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    session.on_rest_ended().unwrap();
    complete(&session, &plan, 1);

    // The move happens on the auto-advance task, not inside the call
    assert_eq!(plan.current_exercise(), 0);
    settle().await;
    assert_eq!(plan.current_exercise(), 1);

    let status = session.status();
    assert_eq!(status.rest.phase, "prompt");
    assert_eq!(status.rest.set_index, Some(1));
    assert_eq!(status.rest.next_duration_seconds, 60);
    assert_eq!(status.rest_exercise, Some(0));
    assert!(!status.stopwatch_running);
    assert!(!status.navigation_locked);

    session.on_rest_started().unwrap();
    advance(secs(50)).await;
    let record = session.on_rest_ended().unwrap().unwrap();
    assert_eq!(record.exercise_index, 0);
    assert_eq!(record.set_index, 1);
    assert_eq!(plan.recorded_rest(0, 1), Some(50));
}

#[tokio::test(start_paused = true)]
async fn undoing_the_last_set_before_advance_stays_put() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    complete(&session, &plan, 1);
    plan.uncomplete_set(1).unwrap();
    session.on_set_uncompleted(1).unwrap();

    settle().await;
    assert_eq!(plan.current_exercise(), 0);
    assert!(!plan.status().exercises[0].sets[1].completed);
}

#[tokio::test(start_paused = true)]
async fn leaving_a_carried_over_rest_resumes_the_clock() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    session.on_rest_ended().unwrap();
    complete(&session, &plan, 1);
    settle().await;
    assert_eq!(plan.current_exercise(), 1);

    let next_rest = session
        .on_exercise_navigated(ExerciseNavigation::Previous)
        .unwrap();

    assert_eq!(next_rest, Some(20));
    assert_eq!(session.rest().phase, "idle");
    assert!(session.is_stopwatch_running());
    assert_eq!(plan.recorded_rest(0, 1), None);
}

#[tokio::test(start_paused = true)]
async fn last_exercise_does_not_auto_advance() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));
    plan.navigate(ExerciseNavigation::Select(1));
    let mut events = session.subscribe_events();

    complete(&session, &plan, 0);
    complete(&session, &plan, 1);
    settle().await;

    assert_eq!(plan.current_exercise(), 1);
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SessionEvent::ExerciseCompleted { .. }));
    }
}

#[tokio::test(start_paused = true)]
async fn adjusting_in_prompt_changes_the_upcoming_rest() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    complete(&session, &plan, 0);
    assert_eq!(session.adjust_rest(15).unwrap(), 35);
    assert_eq!(session.adjust_rest(-60).unwrap(), 0);
    assert_eq!(session.adjust_rest(45).unwrap(), 45);

    let rest = session.on_rest_started().unwrap();
    assert_eq!(rest.target_seconds, 45);
}

#[tokio::test(start_paused = true)]
async fn restored_session_starts_paused() {
    let store = Arc::new(MemoryStore::with_elapsed(300));
    let (session, _plan) = start_session(store.clone());

    assert!(!session.is_stopwatch_running());
    advance(secs(60)).await;
    assert_eq!(session.elapsed_seconds(), 300);

    assert!(session.toggle_stopwatch().unwrap());
    advance(secs(12)).await;
    assert_eq!(session.snapshot(), 312);
    assert_eq!(store.stored(), Some(312));
}

#[tokio::test(start_paused = true)]
async fn reset_while_paused_reads_zero() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));

    advance(secs(30)).await;
    complete(&session, &plan, 0);
    session.reset_stopwatch().unwrap();

    assert_eq!(session.elapsed_seconds(), 0);
    assert!(!session.is_stopwatch_running());
}

#[tokio::test(start_paused = true)]
async fn tickers_publish_wall_clock_values() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));
    let elapsed = session.subscribe_elapsed();
    let rest = session.subscribe_rest();
    let mut events = session.subscribe_events();

    advance(secs(3)).await;
    settle().await;
    assert_eq!(*elapsed.borrow(), 3);

    complete(&session, &plan, 0);
    session.on_rest_started().unwrap();
    advance(secs(21)).await;
    settle().await;

    assert_eq!(*elapsed.borrow(), 3);
    let snapshot = rest.borrow().clone();
    assert_eq!(snapshot.phase, "overticking");
    assert_eq!(snapshot.overtick_seconds, 1);
    assert_eq!(snapshot.actual_seconds, 21);

    let mut reached = false;
    while let Ok(event) = events.try_recv() {
        reached |= event == SessionEvent::RestTargetReached { set_index: 0 };
    }
    assert!(reached);
}

#[tokio::test(start_paused = true)]
async fn finish_reports_duration_and_ends_session() {
    let store = Arc::new(MemoryStore::with_elapsed(100));
    let (session, plan) = start_session(store.clone());
    let elapsed = session.subscribe_elapsed();

    session.toggle_stopwatch().unwrap();
    advance(secs(20)).await;
    complete(&session, &plan, 0);
    session.on_rest_started().unwrap();
    advance(secs(5)).await;

    assert_eq!(session.finish().unwrap(), 120);
    assert!(session.is_ended());
    assert_eq!(store.stored(), None);
    assert_eq!(session.rest().phase, "idle");

    advance(secs(10)).await;
    settle().await;
    assert_eq!(*elapsed.borrow(), 120);
    assert_eq!(session.elapsed_seconds(), 120);

    assert_eq!(session.finish(), Err(SessionError::Ended));
    assert_eq!(session.toggle_stopwatch(), Err(SessionError::Ended));
    // Snapshots after the end must not resurrect the session file
    session.snapshot();
    assert_eq!(store.stored(), None);
}

#[tokio::test(start_paused = true)]
async fn abandon_clears_persisted_session() {
    let store = Arc::new(MemoryStore::with_elapsed(42));
    let (session, _plan) = start_session(store.clone());

    session.abandon().unwrap();

    assert_eq!(store.stored(), None);
    assert_eq!(session.abandon(), Err(SessionError::Ended));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_stops_its_tickers() {
    let (session, plan) = start_session(Arc::new(MemoryStore::new()));
    let elapsed = session.subscribe_elapsed();
    let rest = session.subscribe_rest();

    advance(secs(3)).await;
    settle().await;
    assert_eq!(*elapsed.borrow(), 3);

    complete(&session, &plan, 0);
    session.on_rest_started().unwrap();
    advance(secs(2)).await;
    settle().await;
    assert_eq!(rest.borrow().actual_seconds, 2);

    drop(session);
    advance(secs(10)).await;
    settle().await;

    assert_eq!(*elapsed.borrow(), 3);
    let snapshot = rest.borrow().clone();
    assert_eq!(snapshot.phase, "counting");
    assert_eq!(snapshot.actual_seconds, 2);
}
