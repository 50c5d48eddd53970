//! External collaborators of the workout session
//!
//! The session core never renders, navigates or persists by itself. It calls
//! out through these traits; concrete implementations live in the submodules.

pub mod plan;
pub mod storage;

use crate::error::StoreError;

// Re-export main types
pub use plan::{PlanTracker, PlannedExercise, WorkoutPlan};
pub use storage::{JsonFileStore, MemoryStore, SessionFile};

/// Which way the user moves through the exercises of a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseNavigation {
    Next,
    Previous,
    Select(usize),
}

/// Exercise navigation owned by the surrounding application
pub trait Navigator: Send + Sync {
    /// Index of the exercise currently on screen
    fn current_exercise(&self) -> usize;

    /// Current exercise together with its default rest duration, read in one
    /// step so the pair always belongs to the same exercise
    fn current_exercise_rest(&self) -> (usize, u64);

    fn can_advance_exercise(&self) -> bool;

    /// Whether every set of the exercise is done
    fn is_exercise_complete(&self, exercise_index: usize) -> bool;

    /// Move to another exercise, returning its default rest duration, or
    /// `None` when the move is impossible
    fn navigate(&self, navigation: ExerciseNavigation) -> Option<u64>;

    fn advance_exercise(&self) -> Option<u64> {
        self.navigate(ExerciseNavigation::Next)
    }
}

/// Receives the rest actually taken after a set
pub trait RestRecorder: Send + Sync {
    fn record_rest(&self, exercise_index: usize, set_index: usize, actual_seconds: u64);
}

/// Persistence of the session stopwatch between app launches
pub trait ElapsedStore: Send + Sync {
    fn persist_elapsed(&self, seconds: u64) -> Result<(), StoreError>;

    fn restore_elapsed(&self) -> Result<Option<u64>, StoreError>;

    /// Forget the persisted session once it has ended
    fn clear(&self) -> Result<(), StoreError>;
}
