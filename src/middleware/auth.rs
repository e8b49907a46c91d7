use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config;
use crate::error::ApiError;
use crate::models::Role;

/// Authenticated actor context extracted from the bearer token. Carries the
/// claims as issued; handlers needing fresh profile data resolve the user from
/// the store themselves.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware that validates tokens and injects the actor
/// context into the request.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let claims = auth::validate_jwt(&token, &config::config().security.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Token is not valid"))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get("authorization")
        .ok_or("No token, authorization denied")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token");
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format")
    }
}
