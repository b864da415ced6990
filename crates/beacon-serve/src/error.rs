//! API error types and response formatting.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_core::RejectReason;
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Authentication failed (missing or invalid secret).
    #[error("unauthorized")]
    Unauthorized,

    /// A beacon failed validation.
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store failed; the error text is surfaced to the caller.
    #[error("store failure: {0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<beacon_core::Error> for ApiError {
    fn from(err: beacon_core::Error) -> Self {
        match err {
            beacon_core::Error::Config(msg) => Self::Internal(anyhow::anyhow!(msg)),
            beacon_core::Error::Store(inner) => Self::Store(inner.to_string()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Status and error code for a validation rejection.
fn reject_code(reason: &RejectReason) -> (StatusCode, &'static str) {
    match reason {
        RejectReason::MissingVisitorIdentity => {
            (StatusCode::BAD_REQUEST, "missing_visitor_identity")
        }
        RejectReason::MissingField => (StatusCode::BAD_REQUEST, "missing_field"),
        RejectReason::PayloadTooLarge { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
        }
        RejectReason::MalformedJson(_) => (StatusCode::BAD_REQUEST, "malformed_json"),
        RejectReason::MissingPayloadFields(_) => {
            (StatusCode::BAD_REQUEST, "missing_payload_fields")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            Self::Rejected(reason) => {
                let (status, code) = reject_code(reason);
                (status, code, Some(reason.to_string()))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::Store(msg) => {
                tracing::error!(error = %msg, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_failure",
                    Some(msg.clone()),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some(err.to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_payload_fields_maps_to_400() {
        let (status, code) =
            reject_code(&RejectReason::MissingPayloadFields(vec!["timestamp"]));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "missing_payload_fields");
    }

    #[test]
    fn payload_too_large_maps_to_413() {
        let (status, code) = reject_code(&RejectReason::PayloadTooLarge {
            limit: 100,
            actual: 200,
        });
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(code, "payload_too_large");
    }

    #[test]
    fn rejection_message_names_the_missing_fields() {
        let err = ApiError::Rejected(RejectReason::MissingPayloadFields(vec![
            "timestamp",
            "currentURL",
        ]));
        assert_eq!(
            err.to_string(),
            "missing required fields: timestamp, currentURL"
        );
    }
}
