//! Compact query-parameter beacon for `/api/log-csp`.
//!
//! Widgets embedded under a restrictive Content-Security-Policy cannot
//! always issue a JSON POST; this variant carries the payload as a
//! pre-encoded JSON string in the query.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use beacon_core::{IngestOutcome, IngestRequest, LogKind, PayloadRepresentation};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::visitor_ip;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CspParams {
    #[serde(rename = "projectId")]
    project_id: Option<String>,
    data: Option<String>,
}

/// `GET /api/log-csp`
///
/// The `data` parameter is used verbatim as the canonical payload string,
/// so retries of the same beacon deduplicate byte-for-byte.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CspParams>,
) -> Result<Response, ApiError> {
    let request = IngestRequest {
        project_id: params.project_id.unwrap_or_default(),
        visitor_ip: visitor_ip(&headers),
        data: PayloadRepresentation::RawString(params.data.unwrap_or_default()),
        size_limit: state.config.query_limit_bytes,
        kind: LogKind::Csp,
    };

    match state.pipeline.ingest(&state.store, request).await? {
        IngestOutcome::Accepted => Ok((StatusCode::CREATED, "log entry created").into_response()),
        IngestOutcome::Rejected(reason) => Err(reason.into()),
    }
}
