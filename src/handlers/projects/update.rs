use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{ProjectDetail, ProjectPatch};
use crate::services::ProjectService;
use crate::state::AppState;

/// PUT /projects/:id - Partial update of a project
///
/// Absent fields are left untouched; an absent member list leaves membership
/// alone. Owner or ADMIN only.
pub async fn project_put(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let service = ProjectService::new(state.store);
    let project = service.update(&actor, id, patch).await?;
    Ok(Json(project))
}
