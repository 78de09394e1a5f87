use crate::api::handlers::auth::types::ApiMessage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

/// Domain errors surfaced by the auth handlers. Every variant maps to the
/// stable `{success: false, message}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate identity.
    #[error("{0}")]
    Conflict(String),

    /// Bad credential, unverified account, or invalid/expired token. Messages
    /// stay generic to limit account enumeration.
    #[error("{0}")]
    Auth(String),

    /// Missing or invalid session credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Persistence failure. Logged with detail, surfaced generically.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message) | Self::Conflict(message) | Self::Auth(message) => {
                (StatusCode::BAD_REQUEST, message)
            }
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Self::Store(err) => {
                error!("storage failure: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ApiMessage {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
