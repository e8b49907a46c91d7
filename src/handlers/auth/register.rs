use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::Role;
use crate::services::{AuthResponse, AuthService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// POST /auth/register - Create an account and receive a bearer token
///
/// Role defaults to CLIENT when omitted. Fails with 400 when the email is
/// already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let service = AuthService::new(state.store);
    let response = service
        .register(payload.name, payload.email, payload.password, payload.role)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}
