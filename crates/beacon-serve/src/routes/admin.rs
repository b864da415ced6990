//! Admin listing queries.

use axum::Json;
use axum::extract::{Query, State};
use beacon_store::{LogRow, ProjectSummary};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLogsParams {
    project_id: Option<String>,
}

/// `GET /api/admin/logs?project_id=`
pub async fn logs(
    State(state): State<AppState>,
    Query(params): Query<AdminLogsParams>,
) -> Result<Json<Vec<LogRow>>, ApiError> {
    let Some(project_id) = params.project_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("missing project_id".to_string()));
    };
    Ok(Json(state.store.logs_for_project(&project_id)?))
}

/// `GET /api/admin/projects`
///
/// Every project with the URL of its most recent log entry.
pub async fn projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    Ok(Json(state.store.projects_with_sample_url()?))
}
