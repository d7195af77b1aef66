//! HTTP request handlers for the extraction API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::request::{DeactivateResponse, ListTemplatesQuery};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Largest workbook accepted by `POST /parse`.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/parse", post(parse_handler))
        .route("/templates", get(list_templates_handler))
        .route("/templates/stats", get(template_stats_handler))
        .route(
            "/templates/:identifier/deactivate",
            post(deactivate_template_handler),
        )
        .route("/templates/:identifier", delete(delete_template_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

fn json_ok<T: serde::Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn json_error(error: ApiErrorResponse) -> Response {
    (
        error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error.error),
    )
        .into_response()
}

/// Handler for POST /parse endpoint.
///
/// Accepts raw workbook bytes and returns the parse report. The parse runs
/// on the blocking pool.
async fn parse_handler(State(state): State<AppState>, body: Bytes) -> Response {
    // Correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        bytes = body.len(),
        "Processing parse request"
    );

    if body.is_empty() {
        warn!(correlation_id = %correlation_id, "Empty upload");
        return json_error(ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::empty_body(),
        ));
    }

    let extractor = state.extractor();
    let joined = tokio::task::spawn_blocking(move || extractor.parse_bytes(&body)).await;

    match joined {
        Ok(Ok(report)) => {
            info!(
                correlation_id = %correlation_id,
                parse_id = %report.parse_id,
                records = report.records.len(),
                warnings = report.warnings.len(),
                duration_us = report.duration_us,
                "Parse completed successfully"
            );
            json_ok(report)
        }
        Ok(Err(err)) => {
            warn!(correlation_id = %correlation_id, error = %err, "Parse failed");
            json_error(err.into())
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Parse task aborted");
            json_error(ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal("Parse task did not complete"),
            ))
        }
    }
}

/// Handler for GET /templates endpoint.
async fn list_templates_handler(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Response {
    match state.templates().list(query.include_inactive) {
        Ok(templates) => json_ok(templates),
        Err(err) => {
            warn!(error = %err, "Listing templates failed");
            json_error(err.into())
        }
    }
}

/// Handler for GET /templates/stats endpoint.
async fn template_stats_handler(State(state): State<AppState>) -> Response {
    match state.templates().stats() {
        Ok(stats) => json_ok(stats),
        Err(err) => {
            warn!(error = %err, "Template stats failed");
            json_error(err.into())
        }
    }
}

/// Handler for POST /templates/{identifier}/deactivate endpoint.
async fn deactivate_template_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Response {
    match state.templates().deactivate(&identifier) {
        Ok(true) => {
            info!(template = %identifier, "Template deactivated");
            json_ok(DeactivateResponse {
                identifier,
                deactivated: true,
            })
        }
        Ok(false) => json_error(ApiErrorResponse::new(
            StatusCode::NOT_FOUND,
            ApiError::template_not_found(&identifier),
        )),
        Err(err) => {
            warn!(template = %identifier, error = %err, "Deactivation failed");
            json_error(err.into())
        }
    }
}

/// Handler for DELETE /templates/{identifier} endpoint.
async fn delete_template_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Response {
    match state.templates().hard_delete(&identifier) {
        Ok(true) => {
            info!(template = %identifier, "Template deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => json_error(ApiErrorResponse::new(
            StatusCode::NOT_FOUND,
            ApiError::template_not_found(&identifier),
        )),
        Err(err) => {
            warn!(template = %identifier, error = %err, "Deletion failed");
            json_error(err.into())
        }
    }
}
