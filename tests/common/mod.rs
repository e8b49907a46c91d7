#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use atelier_api::app::app;
use atelier_api::database::MemoryStore;
use atelier_api::state::AppState;

/// Build a fresh application over an in-memory store. Each test gets its own
/// instance, so tests never share state.
pub fn test_app() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())))
}

/// Drive one request through the router and decode the JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("non-JSON body for {} ({})", path, status))?
    };

    Ok((status, value))
}

/// Register an account and return its bearer token plus the user object.
pub async fn register(
    app: &Router,
    name: &str,
    email: &str,
    role: Option<&str>,
) -> Result<(String, Value)> {
    let mut body = json!({
        "name": name,
        "email": email,
        "password": "correct horse battery staple",
    });
    if let Some(role) = role {
        body["role"] = Value::String(role.to_string());
    }

    let (status, json) = send(app, Method::POST, "/auth/register", None, Some(body)).await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "register for {} failed: {} {}",
        email,
        status,
        json
    );

    let token = json["token"]
        .as_str()
        .context("token missing from register response")?
        .to_string();
    Ok((token, json["user"].clone()))
}

pub fn user_id(user: &Value) -> &str {
    user["id"].as_str().unwrap_or_default()
}
