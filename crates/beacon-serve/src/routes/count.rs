//! Aggregate count endpoints.
//!
//! Read-only queries over the whole log store, cached server-side for the
//! same 600 seconds clients are told to cache them.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::cache::get_or_compute;
use crate::error::ApiError;
use crate::state::AppState;

/// Response for `GET /api/count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalTimeResponse {
    /// Sum of time on page across all logs, each row capped at three hours.
    #[serde(rename = "adjustedTotalTime")]
    pub adjusted_total_time: i64,
}

/// `GET /api/count`
pub async fn total_time(
    State(state): State<AppState>,
) -> Result<Json<TotalTimeResponse>, ApiError> {
    let value = get_or_compute(&state.count_cache, "count:total_time", || async {
        Ok(TotalTimeResponse {
            adjusted_total_time: state.store.adjusted_total_time()?,
        })
    })
    .await?;
    Ok(Json(value))
}

/// Response for `GET /api/count/visitors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorCountResponse {
    pub visitors: i64,
}

/// `GET /api/count/visitors`
pub async fn visitors(
    State(state): State<AppState>,
) -> Result<Json<VisitorCountResponse>, ApiError> {
    let value = get_or_compute(&state.count_cache, "count:visitors", || async {
        Ok(VisitorCountResponse {
            visitors: state.store.distinct_visitor_count()?,
        })
    })
    .await?;
    Ok(Json(value))
}

/// Response for `GET /api/count/projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCountResponse {
    pub projects: i64,
}

/// `GET /api/count/projects`
pub async fn projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectCountResponse>, ApiError> {
    let value = get_or_compute(&state.count_cache, "count:projects", || async {
        Ok(ProjectCountResponse {
            projects: state.store.project_count()?,
        })
    })
    .await?;
    Ok(Json(value))
}

/// Response for `GET /api/count/builds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCountResponse {
    /// Distinct payload content hashes across all logs.
    pub builds: i64,
}

/// `GET /api/count/builds`
pub async fn builds(
    State(state): State<AppState>,
) -> Result<Json<BuildCountResponse>, ApiError> {
    let value = get_or_compute(&state.count_cache, "count:builds", || async {
        Ok(BuildCountResponse {
            builds: state.store.distinct_build_count()?,
        })
    })
    .await?;
    Ok(Json(value))
}
