//! HTTP API routes
//!
//! Public endpoints under `/api/v1` accept expressions and answer queries;
//! `/internal/task` is the worker protocol.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use shared_types::{ErrorBody, PATH_CALCULATE, PATH_EXPRESSIONS, PATH_INTERNAL_TASK};
use tracing::warn;

use crate::error::{CompileError, DispatchError};
use crate::AppState;

pub mod expressions;
pub mod tasks;

/// Configure all API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            PATH_CALCULATE,
            post(expressions::calculate).fallback(wrong_method),
        )
        .route(
            PATH_EXPRESSIONS,
            get(expressions::list_expressions).fallback(wrong_method),
        )
        .route(
            &format!("{PATH_EXPRESSIONS}/{{id}}"),
            get(expressions::get_expression).fallback(wrong_method),
        )
        .route(
            PATH_INTERNAL_TASK,
            get(tasks::claim_task)
                .post(tasks::report_task)
                .fallback(method_not_allowed),
        )
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Public endpoints answer a wrong method with 422.
async fn wrong_method() -> ApiError {
    ApiError::Unprocessable("wrong method".to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed,
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::Unprocessable(m)
            | ApiError::Internal(m) => m.clone(),
            ApiError::MethodNotAllowed => "wrong method".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<CompileError> for ApiError {
    fn from(err: CompileError) -> Self {
        ApiError::Unprocessable(format!("invalid expression: {err}"))
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::QueueEmpty
            | DispatchError::NodeNotFound { .. }
            | DispatchError::NodeNotClaimed { .. } => ApiError::NotFound(err.to_string()),
            DispatchError::InvalidOperand(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// `application/json`, with or without parameters.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Decode a JSON body. A wrong content type is always 422; a body that does
/// not decode is mapped through `malformed`.
fn decode_json<T, F>(headers: &HeaderMap, body: &[u8], malformed: F) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> ApiError,
{
    if !is_json(headers) {
        return Err(ApiError::Unprocessable(
            "wrong content-type, expected JSON".to_string(),
        ));
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "failed to decode request body");
        malformed(format!("invalid JSON: {e}"))
    })
}
