use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::ProjectDetail;
use crate::services::ProjectService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// POST /projects - Create a project owned by the actor
///
/// ADMIN and DESIGNER only; clients get 403 and nothing is persisted.
pub async fn project_post(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectDetail>), ApiError> {
    let service = ProjectService::new(state.store);
    let project = service
        .create(&actor, payload.name, payload.description, payload.members)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}
