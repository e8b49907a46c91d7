use axum::{extract::State, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Assemble the full router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected (JWT required)
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use crate::handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn protected_routes() -> Router<AppState> {
    use crate::handlers::{auth, projects};
    use crate::middleware::jwt_auth_middleware;

    Router::new()
        .route("/auth/me", get(auth::whoami))
        .route(
            "/projects",
            get(projects::project_list).post(projects::project_post),
        )
        .route(
            "/projects/:id",
            get(projects::project_get)
                .put(projects::project_put)
                .delete(projects::project_delete),
        )
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Atelier API",
        "version": version,
        "description": "Project management backend for an interior design studio",
        "endpoints": {
            "home": "/ (public)",
            "auth": "/auth/register, /auth/login (public), /auth/me (protected)",
            "projects": "/projects[/:id] (protected)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "store_error": e.to_string()
            })),
        ),
    }
}
