//! Worker protocol: claim a task, report its result

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode, Json};
use shared_types::{Task, TaskReport};
use tracing::{debug, warn};

use super::{decode_json, ApiError};
use crate::AppState;

/// GET /internal/task
pub async fn claim_task(State(state): State<Arc<AppState>>) -> Result<Json<Task>, ApiError> {
    match state.scheduler.claim().await? {
        Some(task) => Ok(Json(task)),
        None => {
            debug!("no tasks available");
            Err(ApiError::NotFound("no tasks available".to_string()))
        }
    }
}

/// POST /internal/task
pub async fn report_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let report: TaskReport = decode_json(&headers, &body, ApiError::BadRequest)?;
    debug!(
        node_id = report.id,
        result = report.result,
        error = report.error_message(),
        "task result received"
    );

    match state.scheduler.report(&report).await {
        Ok(_) => Ok(StatusCode::OK),
        Err(e) => {
            warn!(node_id = report.id, error = %e, "task report rejected");
            Err(e.into())
        }
    }
}
