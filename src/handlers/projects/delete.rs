use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ProjectService;
use crate::state::AppState;

/// DELETE /projects/:id - Remove a project and its membership relations
///
/// Owner or ADMIN only. Deleting an already-deleted project answers 404, not a
/// second success.
pub async fn project_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let service = ProjectService::new(state.store);
    service.delete(&actor, id).await?;
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}
