//! Error types for the session core and its collaborators

use thiserror::Error;

/// Rejected orchestrator transitions. None of these are fatal; callers surface
/// them as a conflict and the session state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while rest is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("exercise navigation is locked while a rest is {phase}")]
    RestInProgress { phase: &'static str },
    #[error("session has already ended")]
    Ended,
}

/// Failures of the workout plan collaborator
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("set {set_index} does not exist for exercise '{exercise}' ({sets} sets)")]
    SetOutOfRange {
        exercise: String,
        set_index: usize,
        sets: usize,
    },
    #[error("exercise {0} does not exist in the plan")]
    ExerciseOutOfRange(usize),
    #[error("workout plan has no exercises")]
    EmptyPlan,
    #[error("I/O error reading workout plan")]
    Io(#[from] std::io::Error),
    #[error("workout plan is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the elapsed-time persistence collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error accessing session file")]
    Io(#[from] std::io::Error),
    #[error("session file could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),
}
