use axum::{extract::State, response::Json, Extension};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::ProjectListItem;
use crate::services::ProjectService;
use crate::state::AppState;

/// GET /projects - Projects visible to the actor
///
/// ADMIN sees everything, DESIGNER what they own or belong to, CLIENT only
/// what they belong to.
pub async fn project_list(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<Vec<ProjectListItem>>, ApiError> {
    let service = ProjectService::new(state.store);
    let projects = service.list(&actor).await?;
    Ok(Json(projects))
}
