use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::{AuthResponse, AuthService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Authenticate and receive a bearer token
///
/// Unknown email and wrong password both answer 400 "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let service = AuthService::new(state.store);
    let response = service.login(&payload.email, &payload.password).await?;
    Ok(Json(response))
}
