use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced to callers of the HTTP endpoints. Mirrors the status
/// vocabulary of the request/reply protocol: unauthenticated, out-of-range
/// and resource-exhausted conditions each keep their own code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("no user id value set")]
    MissingUserId,

    #[error("ping too big")]
    ClockSkew,

    #[error("no token set")]
    MissingToken,

    #[error("unable to validate token")]
    InvalidToken,

    #[error("session is full")]
    SessionFull,
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUserId | Self::MissingToken | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::ClockSkew => StatusCode::BAD_REQUEST,
            Self::SessionFull => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
