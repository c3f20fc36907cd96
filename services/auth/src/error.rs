use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::types::RateLimitInfo;

/// Auth service error variants.
///
/// Expected negatives (bad code, no session, rate limited) are ordinary
/// variants the caller branches on; only `Internal` is a fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("user not allowed")]
    UserNotAllowed,
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("too many attempts")]
    RateLimited(RateLimitInfo),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::UserNotAllowed => "USER_NOT_ALLOWED",
            Self::InvalidCode => "INVALID_CODE",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::UserNotAllowed => StatusCode::FORBIDDEN,
            Self::InvalidCode | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected outcomes; only internal errors carry a chain worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::RateLimited(info) = self {
            body["remaining"] = info.remaining.into();
            body["resetAt"] = info.reset_at.to_rfc3339().into();
        }
        (status, axum::Json(body)).into_response()
    }
}
