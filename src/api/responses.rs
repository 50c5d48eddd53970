//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::plan::PlanStatus,
    state::{RestRecord, SessionStatus},
};

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_record: Option<RestRecord>,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, session: SessionStatus) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session,
            rest_record: None,
        }
    }

    /// The request changed session state
    pub fn ok(message: String, session: SessionStatus) -> Self {
        Self::new("ok", message, session)
    }

    /// The request was valid but had nothing to act on
    pub fn unchanged(message: String, session: SessionStatus) -> Self {
        Self::new("unchanged", message, session)
    }

    pub fn with_rest_record(mut self, record: Option<RestRecord>) -> Self {
        self.rest_record = record;
        self
    }
}

/// Body of `POST /rest/adjust`. `delta_seconds` wins over `steps`; a step is
/// the server's configured rest increment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestAdjustRequest {
    pub delta_seconds: Option<i64>,
    pub steps: Option<i64>,
}

/// Full status including plan progress and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionStatus,
    pub plan: PlanStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Result of finishing a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishResponse {
    pub elapsed_seconds: u64,
    pub duration: String,
    pub plan: PlanStatus,
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
