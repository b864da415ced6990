//! Bearer-secret authentication.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the bearer secret in `Authorization` to a project id.
///
/// The secret must be provided as:
/// ```text
/// Authorization: Bearer <secret>
/// ```
///
/// The secret is digested with the server pepper and looked up against
/// `projects.secret_key_hash`; the raw secret is never persisted or logged.
pub fn authorize_project(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());

    let secret = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            tracing::debug!("missing or malformed authorization header");
            return Err(ApiError::Unauthorized);
        }
    };

    let secret_key_hash = state.hasher.digest(secret);
    match state.store.project_id_for_secret_hash(&secret_key_hash)? {
        Some(project_id) => Ok(project_id),
        None => {
            tracing::debug!("secret does not match any project");
            Err(ApiError::Unauthorized)
        }
    }
}
