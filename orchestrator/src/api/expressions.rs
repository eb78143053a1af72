//! Submission and query endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use shared_types::{CalculateRequest, CalculateResponse, ExpressionDetail, ExpressionList};
use tracing::{info, warn};

use super::{decode_json, ApiError};
use crate::AppState;

/// POST /api/v1/calculate
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CalculateResponse>, ApiError> {
    let request: CalculateRequest = decode_json(&headers, &body, ApiError::Unprocessable)?;

    match state.scheduler.submit(&request.expression).await {
        Ok(response) => {
            info!(
                expression_id = response.id,
                status = %response.status,
                "calculation request accepted"
            );
            Ok(Json(response))
        }
        Err(e) => {
            warn!(expression = %request.expression, error = %e, "rejected expression");
            Err(e.into())
        }
    }
}

/// GET /api/v1/expressions
pub async fn list_expressions(State(state): State<Arc<AppState>>) -> Json<ExpressionList> {
    Json(state.scheduler.list().await)
}

/// GET /api/v1/expressions/:id
///
/// Accepts both `/7` and the legacy `/:7` form.
pub async fn get_expression(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ExpressionDetail>, ApiError> {
    let id = parse_expression_id(&raw_id)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid expression id: {raw_id}")))?;

    state
        .scheduler
        .detail(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("expression {id} not found")))
}

fn parse_expression_id(raw: &str) -> Option<u64> {
    raw.strip_prefix(':').unwrap_or(raw).parse().ok()
}
