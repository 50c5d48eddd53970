//! Workout plan: exercise order, set completion and logged rest

use std::{fs, path::Path, sync::Mutex, sync::MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ExerciseNavigation, Navigator, RestRecorder};
use crate::error::PlanError;

/// One exercise as planned in a workout template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedExercise {
    pub name: String,
    pub sets: usize,
    pub rest_seconds: u64,
}

impl PlannedExercise {
    pub fn new(name: &str, sets: usize, rest_seconds: u64) -> Self {
        Self {
            name: name.to_string(),
            sets,
            rest_seconds,
        }
    }
}

/// A workout template as imported from JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub name: String,
    pub exercises: Vec<PlannedExercise>,
}

impl WorkoutPlan {
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path)?;
        let plan: WorkoutPlan = serde_json::from_str(&content)?;
        info!(
            "Loaded workout plan '{}' with {} exercises from {}",
            plan.name,
            plan.exercises.len(),
            path.display()
        );
        Ok(plan)
    }

    /// Plan used when none is supplied on the command line
    pub fn default_plan() -> Self {
        Self {
            name: "Full Body".to_string(),
            exercises: vec![
                PlannedExercise::new("Squat", 3, 120),
                PlannedExercise::new("Bench Press", 3, 90),
                PlannedExercise::new("Barbell Row", 3, 90),
            ],
        }
    }
}

/// Logged state of a single set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SetLog {
    pub completed: bool,
    pub rest_seconds: Option<u64>,
}

/// Serializable progress through the plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStatus {
    pub name: String,
    pub current_exercise: usize,
    pub current_exercise_name: String,
    pub exercises: Vec<ExerciseStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseStatus {
    pub name: String,
    pub rest_seconds: u64,
    pub sets: Vec<SetLog>,
}

#[derive(Debug)]
struct PlanProgress {
    current: usize,
    sets: Vec<Vec<SetLog>>,
}

/// Tracks a running workout against its plan. Serves as the session's
/// navigator and rest recorder.
#[derive(Debug)]
pub struct PlanTracker {
    plan: WorkoutPlan,
    progress: Mutex<PlanProgress>,
}

impl PlanTracker {
    pub fn new(plan: WorkoutPlan) -> Result<Self, PlanError> {
        if plan.exercises.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        let sets = plan
            .exercises
            .iter()
            .map(|exercise| vec![SetLog::default(); exercise.sets])
            .collect();

        Ok(Self {
            plan,
            progress: Mutex::new(PlanProgress { current: 0, sets }),
        })
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    fn progress(&self) -> MutexGuard<'_, PlanProgress> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_mut<'a>(
        &self,
        progress: &'a mut PlanProgress,
        set_index: usize,
    ) -> Result<&'a mut SetLog, PlanError> {
        let exercise = &self.plan.exercises[progress.current];
        progress.sets[progress.current]
            .get_mut(set_index)
            .ok_or_else(|| PlanError::SetOutOfRange {
                exercise: exercise.name.clone(),
                set_index,
                sets: exercise.sets,
            })
    }

    /// Mark a set of the current exercise done. Returns whether every set of
    /// the exercise is now complete.
    pub fn complete_set(&self, set_index: usize) -> Result<bool, PlanError> {
        let mut progress = self.progress();
        self.set_mut(&mut progress, set_index)?.completed = true;

        let all_done = progress.sets[progress.current]
            .iter()
            .all(|set| set.completed);
        debug!(
            "Set {} of exercise {} completed (exercise complete: {})",
            set_index, progress.current, all_done
        );
        Ok(all_done)
    }

    pub fn uncomplete_set(&self, set_index: usize) -> Result<(), PlanError> {
        let mut progress = self.progress();
        let set = self.set_mut(&mut progress, set_index)?;
        set.completed = false;
        set.rest_seconds = None;
        Ok(())
    }

    pub fn status(&self) -> PlanStatus {
        let progress = self.progress();
        PlanStatus {
            name: self.plan.name.clone(),
            current_exercise: progress.current,
            current_exercise_name: self.plan.exercises[progress.current].name.clone(),
            exercises: self
                .plan
                .exercises
                .iter()
                .zip(&progress.sets)
                .map(|(exercise, sets)| ExerciseStatus {
                    name: exercise.name.clone(),
                    rest_seconds: exercise.rest_seconds,
                    sets: sets.clone(),
                })
                .collect(),
        }
    }

    /// Rest recorded for a set, if any
    pub fn recorded_rest(&self, exercise_index: usize, set_index: usize) -> Option<u64> {
        self.progress()
            .sets
            .get(exercise_index)?
            .get(set_index)?
            .rest_seconds
    }
}

impl Navigator for PlanTracker {
    fn current_exercise(&self) -> usize {
        self.progress().current
    }

    fn current_exercise_rest(&self) -> (usize, u64) {
        let current = self.progress().current;
        (current, self.plan.exercises[current].rest_seconds)
    }

    fn can_advance_exercise(&self) -> bool {
        self.progress().current + 1 < self.plan.exercises.len()
    }

    fn is_exercise_complete(&self, exercise_index: usize) -> bool {
        self.progress()
            .sets
            .get(exercise_index)
            .is_some_and(|sets| sets.iter().all(|set| set.completed))
    }

    fn navigate(&self, navigation: ExerciseNavigation) -> Option<u64> {
        let mut progress = self.progress();
        let target = match navigation {
            ExerciseNavigation::Next => progress.current + 1,
            ExerciseNavigation::Previous => progress.current.checked_sub(1)?,
            ExerciseNavigation::Select(index) => index,
        };

        let exercise = self.plan.exercises.get(target)?;
        progress.current = target;
        info!("Now on exercise {} ({})", target, exercise.name);
        Some(exercise.rest_seconds)
    }
}

impl RestRecorder for PlanTracker {
    fn record_rest(&self, exercise_index: usize, set_index: usize, actual_seconds: u64) {
        let mut progress = self.progress();
        match progress
            .sets
            .get_mut(exercise_index)
            .and_then(|sets| sets.get_mut(set_index))
        {
            Some(set) => {
                set.rest_seconds = Some(actual_seconds);
                debug!(
                    "Recorded {}s rest after set {} of exercise {}",
                    actual_seconds, set_index, exercise_index
                );
            }
            None => warn!(
                "Dropping rest record for unknown set {} of exercise {}",
                set_index, exercise_index
            ),
        }
    }
}
