use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "health": "healthy" }))
}

/// Ready once the database answers and the storage provider is bound
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let database_up = state.files.is_healthy().await;
    let storage_ready = state.storage.is_initialized();

    let status = if database_up && storage_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "database": if database_up { "up" } else { "down" },
            "storage": if storage_ready { "initialized" } else { "uninitialized" },
        })),
    )
}
