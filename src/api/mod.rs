pub mod admin;
pub mod auth;
pub mod chat;
pub mod community;
pub mod expenses;
pub mod profile;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::models::LlmConfigResponse;
use crate::state::AppState;

/// GET / - Liveness
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running!" }))
}

/// GET /api/debug-db - Confirms the user collection is readable
pub async fn debug_db(State(state): State<AppState>) -> Json<Value> {
    let count = state.users.count();
    tracing::debug!("Users in database: {count}");
    Json(json!({
        "message": "Database connection OK",
        "user_count": count,
    }))
}

/// GET /api/config - Runtime LLM config with the API key redacted
pub async fn get_config(State(state): State<AppState>) -> Json<LlmConfigResponse> {
    Json(admin::config_view(&state))
}
