//! Project registration.

use axum::Json;
use axum::extract::{Query, State};
use hex::ToHex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::mailer::screen_address;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegistrationParams {
    email: Option<String>,
}

/// Response carrying the only copy of the raw secret the system ever hands
/// out; only its digest is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResponse {
    pub project_id: String,
    pub secret_key: String,
}

/// `GET /api/registration`
///
/// Issues a fresh project id / secret key pair. With a valid `email`
/// parameter the pair is also delivered by mail; delivery failure is logged
/// and does not fail the registration.
pub async fn register(
    State(state): State<AppState>,
    Query(params): Query<RegistrationParams>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let email = match params
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        Some(address) => {
            screen_address(address, &state.config.email_blocklist).map_err(ApiError::BadRequest)?;
            Some(address.to_string())
        }
        None => None,
    };

    let project_id = Uuid::new_v4().to_string();
    let secret_key = generate_secret();
    let secret_key_hash = state.hasher.digest(&secret_key);
    state
        .store
        .create_project(&project_id, &secret_key_hash, email.as_deref())?;

    if let (Some(mailer), Some(address)) = (&state.mailer, email.as_deref()) {
        if let Err(err) = mailer
            .send_credentials(address, &project_id, &secret_key)
            .await
        {
            tracing::warn!(error = %err, "registration mail delivery failed");
        }
    }

    tracing::info!(project_id = %project_id, "project registered");
    Ok(Json(RegistrationResponse {
        project_id,
        secret_key,
    }))
}

/// 256-bit random secret, hex-encoded.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.encode_hex()
}
