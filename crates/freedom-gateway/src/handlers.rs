// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! User routes redirect back to the migration page. Task routes answer with a
//! status code the queue uses to decide on redelivery.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use freedom_core::{FreedomError, HealthStatus, MigrationKey};
use freedom_pipeline::{ControlMessage, MigrationStatus, TaskHandler};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: String,
}

/// A pipeline error surfaced on a user route.
#[derive(Debug)]
pub struct ApiError(pub FreedomError);

impl From<FreedomError> for ApiError {
    fn from(err: FreedomError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FreedomError::NotFound { .. } => StatusCode::NOT_FOUND,
            FreedomError::Conflict { .. } => StatusCode::CONFLICT,
            FreedomError::Serialization(_) | FreedomError::InvariantViolation(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        error_response(status, &self.0)
    }
}

/// Status code for a failed task delivery.
///
/// 409 while another attempt holds the lease, 417 for errors no retry can
/// fix, 500 for everything else.
pub fn task_status(err: &FreedomError) -> StatusCode {
    if err.is_conflict() {
        StatusCode::CONFLICT
    } else if err.is_fatal() {
        StatusCode::EXPECTATION_FAILED
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(status: StatusCode, err: &FreedomError) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn migration_page(id: i64, message: Option<ControlMessage>) -> Result<Redirect, ApiError> {
    let Some(message) = message else {
        return Ok(Redirect::to(&format!("/migration/{id}")));
    };
    let query = serde_urlencoded::to_string([("message", message.as_str())])
        .map_err(|e| FreedomError::Internal(format!("failed to encode redirect: {e}")))?;
    Ok(Redirect::to(&format!("/migration/{id}?{query}")))
}

/// POST /migrate
///
/// Starts (or finds) the migration for the posted account pair and redirects
/// to its status page.
pub async fn post_migrate(
    State(state): State<GatewayState>,
    Json(key): Json<MigrationKey>,
) -> Result<Redirect, ApiError> {
    let migration = state.pipeline.control.start(&key).await?;
    migration_page(migration.id, None)
}

/// GET /migration/{id}
pub async fn get_migration(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Json<MigrationStatus>, ApiError> {
    Ok(Json(state.pipeline.control.status(id).await?))
}

/// POST /migration/{id}/stop
pub async fn post_stop(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    let message = state.pipeline.control.stop(id).await?;
    migration_page(id, Some(message))
}

/// POST /migration/{id}/resume
pub async fn post_resume(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Redirect, ApiError> {
    let message = state.pipeline.control.resume(id).await?;
    migration_page(id, Some(message))
}

/// POST /_ah/queue/scan
pub async fn post_scan_task(State(state): State<GatewayState>, body: String) -> Response {
    run_task(state.scan.clone(), body).await
}

/// POST /_ah/queue/propagate
pub async fn post_propagate_task(State(state): State<GatewayState>, body: String) -> Response {
    run_task(state.propagate.clone(), body).await
}

/// Runs the task on its own tokio task so a disconnecting client cannot
/// cancel it between publish and complete.
async fn run_task(handler: Arc<dyn TaskHandler>, body: String) -> Response {
    let queue = handler.queue();
    let result = tokio::spawn(async move { handler.handle(&body).await })
        .await
        .unwrap_or_else(|e| Err(FreedomError::Internal(format!("task handler panicked: {e}"))));
    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            let status = task_status(&e);
            tracing::warn!(queue, status = %status, error = %e, "pushed task failed");
            error_response(status, &e)
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let adapters: Vec<AdapterHealth> = state
        .pipeline
        .registry
        .health()
        .await
        .into_iter()
        .map(|(name, status)| AdapterHealth {
            name,
            status: match status {
                HealthStatus::Healthy => "healthy".to_string(),
                HealthStatus::Degraded(why) => format!("degraded: {why}"),
                HealthStatus::Unhealthy(why) => format!("unhealthy: {why}"),
            },
        })
        .collect();
    let healthy = adapters.iter().all(|a| a.status == "healthy");
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        adapters,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn conflicts_are_409() {
        let err = FreedomError::Conflict {
            key: "1".into(),
            leased_until: chrono::Utc::now(),
        };
        assert_eq!(task_status(&err), StatusCode::CONFLICT);
    }

    #[test]
    fn unfixable_errors_are_417() {
        assert_eq!(
            task_status(&FreedomError::not_found("migratable", "1")),
            StatusCode::EXPECTATION_FAILED
        );
        assert_eq!(
            task_status(&FreedomError::InvariantViolation("bad".into())),
            StatusCode::EXPECTATION_FAILED
        );
    }

    #[test]
    fn adapter_failures_are_500() {
        assert_eq!(
            task_status(&FreedomError::destination("down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            task_status(&FreedomError::Timeout {
                duration: Duration::from_secs(1)
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn redirect_message_is_query_encoded() {
        let response = migration_page(7, Some(ControlMessage::AlreadyStopped))
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/migration/7?message=Migration+is+already+stopped."
        );
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "something went wrong".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("something went wrong"));
    }
}
