//! Caller authentication middleware

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::auth::AuthContext;

/// Extractor that requires a resolved caller identity
///
/// The token is taken from either:
/// - Authorization header: `Bearer <token>`
/// - X-API-Key header: `<token>`
///
/// Handlers receive the resolved `AuthContext` as a plain value and pass it
/// into every service call.
#[derive(Debug, Clone)]
pub struct RequireUser(pub AuthContext);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_headers(&parts.headers)?;

        debug!(
            token_prefix = %token.chars().take(8).collect::<String>(),
            "Resolving caller identity"
        );

        let ctx = state
            .auth_service
            .resolve(&token)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        Ok(RequireUser(ctx))
    }
}

fn extract_token_from_headers(headers: &axum::http::HeaderMap) -> Result<String, ApiError> {
    // Try Authorization header first (Bearer token)
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(api_key_header) = headers.get("x-api-key") {
        let key = api_key_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?;

        return Ok(key.trim().to_string());
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header",
    ))
}
