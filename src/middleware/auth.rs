//! Bearer token middleware
//!
//! Protected routes only require that a non-empty bearer token is present.
//! The token is not verified; acting identities travel as `username` parameters.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::{utils::error::ErrorResponse, AppState};

/// Authentication error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authentication token",
            AuthError::InvalidToken => "Invalid authentication token",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized", message)),
        )
            .into_response()
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Check the Authorization header of a request
pub fn check_bearer(auth_header: Option<&str>) -> Result<(), AuthError> {
    let header = auth_header.ok_or(AuthError::MissingToken)?;
    extract_bearer_token(header)
        .map(|_| ())
        .ok_or(AuthError::InvalidToken)
}

/// Authentication middleware
///
/// Rejects requests without a bearer token unless `auth.require_bearer_token` is off.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.config.auth.require_bearer_token {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        if let Err(e) = check_bearer(header) {
            tracing::debug!(path = %request.uri().path(), error = ?e, "Rejected unauthenticated request");
            return Err(e);
        }
    }

    Ok(next.run(request).await)
}
