use std::sync::Arc;

use atelier_api::app::app;
use atelier_api::config;
use atelier_api::database::PgStore;
use atelier_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Atelier API in {:?} mode", config.environment);

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost:5432/atelier".to_string());

    let store = match PgStore::connect(&database_url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("failed to connect to {}: {}", database_url, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = store.ensure_schema().await {
        tracing::error!("failed to prepare database schema: {}", e);
        std::process::exit(1);
    }

    let state = AppState::new(Arc::new(store));
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Atelier API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
