//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use mapmem_shared::{AppError, Claims, JwtError, types::AccountId};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{app_error_response, error_response},
};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validates the bearer token and stores its claims in request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "Authorization header with Bearer token is required",
            None,
        );
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => error_response(
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "Token has expired",
            None,
        ),
        Err(_) => error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Invalid or malformed token",
            None,
        ),
    }
}

/// Lets the request through only if the authenticated caller is an admin.
///
/// Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<Claims>() {
        Some(claims) if claims.is_admin() => next.run(request).await,
        Some(_) => app_error_response(&AppError::Forbidden("Admin access required".to_string())),
        None => app_error_response(&AppError::Unauthorized("Authentication required".to_string())),
    }
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let account_id = auth.account_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The caller's account.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        AccountId::from_uuid(self.0.account_id())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required",
                        "details": null
                    })),
                )
            })
    }
}
