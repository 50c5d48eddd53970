//! Shared state behind the HTTP API

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::WorkoutSession;
use crate::{services::PlanTracker, utils::format};

/// Everything a request handler needs: the running session, the plan it is
/// tracked against and some server metadata
#[derive(Debug)]
pub struct AppState {
    pub session: Arc<WorkoutSession>,
    pub plan: Arc<PlanTracker>,
    /// Step applied by the rest +/- controls
    pub rest_step_seconds: u64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        session: Arc<WorkoutSession>,
        plan: Arc<PlanTracker>,
        rest_step_seconds: u64,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            session,
            plan,
            rest_step_seconds,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Remember the most recent state-changing request
    pub fn record_action(&self, action: &str) {
        debug!("Action: {}", action);
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Server uptime as `Xh Ym`
    pub fn get_uptime(&self) -> String {
        format::hours_minutes(self.start_time.elapsed().as_secs())
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
