//! Beacon submission and authenticated retrieval for `/api/log`.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use beacon_core::{IngestOutcome, IngestRequest, LogKind, PayloadRepresentation};
use beacon_store::LogRow;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::authorize_project;
use crate::error::ApiError;
use crate::routes::visitor_ip;
use crate::state::AppState;

/// JSON body of a beacon submission.
#[derive(Debug, Deserialize)]
pub struct LogBody {
    #[serde(rename = "projectId", alias = "project_id")]
    project_id: Option<String>,
    data: Option<Value>,
}

/// `POST /api/log`
///
/// Accepts `data` as either a JSON-encoded string or a structured object;
/// both run through the same validation and deduplication pipeline. A
/// replayed duplicate returns the same `201` as a fresh insert.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LogBody>,
) -> Result<Response, ApiError> {
    let request = IngestRequest {
        project_id: body.project_id.unwrap_or_default(),
        visitor_ip: visitor_ip(&headers),
        data: match body.data {
            Some(Value::String(s)) => PayloadRepresentation::RawString(s),
            Some(value) => PayloadRepresentation::Structured(value),
            None => PayloadRepresentation::Structured(Value::Null),
        },
        size_limit: state.config.body_limit_bytes,
        kind: LogKind::Log,
    };

    match state.pipeline.ingest(&state.store, request).await? {
        IngestOutcome::Accepted => Ok((StatusCode::CREATED, "log entry created").into_response()),
        IngestOutcome::Rejected(reason) => Err(reason.into()),
    }
}

/// `GET /api/log`
///
/// Returns every log row of the project whose secret matches the bearer
/// token, and nothing from any other project.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LogRow>>, ApiError> {
    let project_id = authorize_project(&state, &headers)?;
    let rows = state.store.logs_for_project(&project_id)?;
    Ok(Json(rows))
}
