use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AuthContext;
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Header carrying the authenticated user's id, set by the upstream gateway.
pub const X_USER_ID: &str = "x-user-id";

/// Extractor that requires a resolvable identity.
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingIdentity,
    InvalidFormat,
    UnknownUser,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingIdentity => "Missing identity header",
            AuthError::InvalidFormat => "Invalid identity header",
            AuthError::UnknownUser => "Unknown user",
        };

        let body = ErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            request_id: None,
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(X_USER_ID)
            .ok_or(AuthError::MissingIdentity)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let user_id = Uuid::parse_str(raw).map_err(|_| AuthError::InvalidFormat)?;

        let user = state.store.get_user(user_id).ok_or_else(|| {
            tracing::warn!(%user_id, "Identity header references unknown user");
            AuthError::UnknownUser
        })?;

        Ok(RequireAuth(AuthContext::from_user(&user)))
    }
}
