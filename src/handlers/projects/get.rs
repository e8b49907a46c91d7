use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::ProjectDetail;
use crate::services::ProjectService;
use crate::state::AppState;

/// GET /projects/:id - Single project with owner and member summaries
pub async fn project_get(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let service = ProjectService::new(state.store);
    let project = service.get(&actor, id).await?;
    Ok(Json(project))
}
