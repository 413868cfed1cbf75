use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every way an authentication step can fail.
///
/// Only `Expired` (on an access token) and `TokenMissing` are ever turned into a
/// refresh attempt, and only by the auto-refresh middleware. Everything else is
/// terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid access token")]
    Malformed,
    #[error("Invalid access token")]
    BadSignature,
    #[error("Access token expired")]
    Expired,
    #[error("Refresh token expired")]
    RefreshExpired,
    #[error("Invalid refresh token")]
    InvalidRefresh,
    #[error("Unknown subject")]
    UnknownSubject,
    #[error("Token required")]
    TokenMissing,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message sent to the client. Internal failures never leak their cause.
    pub fn detail(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(e) = &self {
            tracing::error!("auth internal error: {e:#}");
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
