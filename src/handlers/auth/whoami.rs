use axum::{extract::State, response::Json, Extension};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::PublicUser;
use crate::services::AuthService;
use crate::state::AppState;

/// GET /auth/me - Current user for a valid bearer token
///
/// The profile is re-read from the store rather than trusted from the token,
/// so a user removed since issuance answers 404.
pub async fn whoami(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<PublicUser>, ApiError> {
    let service = AuthService::new(state.store);
    let user = service.current_user(actor.user_id).await?;
    Ok(Json(user))
}
