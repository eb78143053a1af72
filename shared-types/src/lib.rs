//! Shared types between the orchestrator and its workers
//!
//! These types are used by both:
//! - the orchestrator HTTP API (axum handlers)
//! - the worker agent (reqwest client)
//!
//! Serializable with serde for JSON over HTTP

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Paths
// ============================================================================

pub const PATH_CALCULATE: &str = "/api/v1/calculate";
pub const PATH_EXPRESSIONS: &str = "/api/v1/expressions";
pub const PATH_INTERNAL_TASK: &str = "/internal/task";

// ============================================================================
// Expressions
// ============================================================================

/// Lifecycle of a submitted expression as reported to clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    #[serde(rename = "just_created")]
    Created,
    InQueue,
    InProgress,
    Done,
    Error,
}

impl ExpressionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionStatus::Created => "just_created",
            ExpressionStatus::InQueue => "in_queue",
            ExpressionStatus::InProgress => "in_progress",
            ExpressionStatus::Done => "done",
            ExpressionStatus::Error => "error",
        }
    }

    /// `Done` and `Error` are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExpressionStatus::Done | ExpressionStatus::Error)
    }
}

impl std::fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST /api/v1/calculate request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

/// POST /api/v1/calculate response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculateResponse {
    pub id: u64,
    pub status: ExpressionStatus,
}

/// One entry of GET /api/v1/expressions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpressionSummary {
    pub id: u64,
    pub status: ExpressionStatus,
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpressionList {
    pub expressions: Vec<ExpressionSummary>,
}

/// GET /api/v1/expressions/:id response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpressionDetail {
    pub id: u64,
    pub status: ExpressionStatus,
    pub result: f64,
}

// ============================================================================
// Worker protocol
// ============================================================================

/// GET /internal/task response body: one claimed graph node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Node id, local to the expression at the head of the queue
    pub id: u64,
    pub arg1: f64,
    pub arg2: f64,
    pub operation: String,
    /// Simulated cost the worker sleeps for before reporting
    #[serde(with = "duration_nanos")]
    pub operation_time: Duration,
}

/// POST /internal/task request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskReport {
    pub id: u64,
    #[serde(default)]
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskReport {
    pub fn success(id: u64, result: f64) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: 0.0,
            error: Some(error.into()),
        }
    }

    /// The reported error, ignoring empty strings sent by lenient workers.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// JSON body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// Durations travel as integer nanoseconds.
pub mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(d)?;
        Ok(Duration::from_nanos(nanos))
    }
}

// ============================================================================
// Tests
// ============================================================================
