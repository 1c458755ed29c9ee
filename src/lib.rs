//! # loan-advisor
//!
//! Backend for a multilingual loan-advisory web app: user accounts and
//! profiles, a retrieval-augmented loan chat (text and voice), a community
//! feed, a personal expense log and an admin console that ingests PDFs
//! into the vector store.
//!
//! ## Architecture
//!
//! A chat message flows through one sequential pipeline:
//!
//! ```text
//!                     ┌──────────────┐
//!                     │ User message │   (voice: Sarvam speech-to-text first)
//!                     └──────┬───────┘
//!                            ▼
//!                ┌───────────────────────┐
//!                │ Detect language       │
//!                │ Translate to English  │
//!                └───────────┬───────────┘
//!                            ▼
//!                ┌───────────────────────┐
//!                │ Rephrase + classify   │
//!                │ intent                │
//!                └───────────┬───────────┘
//!                            ▼
//!                ┌───────────────────────┐
//!                │ Embed query           │
//!                └───────────┬───────────┘
//!               ┌────────────┴────────────┐
//!               ▼                         ▼
//!      ┌─────────────────┐      ┌──────────────────┐
//!      │ User_<id> (k=1) │      │ Admin (k=10)     │
//!      │ profile text    │      │ loan guidance    │
//!      └────────┬────────┘      └────────┬─────────┘
//!               └────────────┬───────────┘
//!                            ▼
//!                ┌───────────────────────┐
//!                │ LLM answer            │
//!                │ (or canned small talk)│
//!                └───────────┬───────────┘
//!                            ▼
//!                ┌───────────────────────┐
//!                │ Translate back        │
//!                │ Render HTML / TTS     │
//!                └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration
//! - [`store`] - JSON-file document collections (users, posts, expenses, admins)
//! - [`auth`] - Password hashing, JWTs and the `AuthUser` / `AdminUser` extractors
//! - [`language`] - Language detection and speech-service language codes
//! - [`speech`] - Sarvam translation, speech-to-text and text-to-speech client
//! - [`llm`] - Embeddings, completions and prompt templates (Gemini, Ollama, OpenAI)
//! - [`vectors`] - Local or Weaviate vector storage
//! - [`advisor`] - The chat pipeline, intent rules and HTML formatting
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod advisor;
pub mod api;
pub mod auth;
pub mod chunking;
pub mod config;
pub mod error;
pub mod language;
pub mod llm;
pub mod loan_model;
pub mod models;
pub mod pdf;
pub mod speech;
pub mod state;
pub mod store;
pub mod vectors;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the HTTP router over `state`.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.config.uploads_dir());
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(api::root))
        .route("/api/debug-db", get(api::debug_db))
        .route("/api/config", get(api::get_config))
        // Accounts and profile
        .route("/api/register", post(api::auth::register))
        .route("/api/login", post(api::auth::login))
        .route("/api/profile", put(api::profile::update_profile))
        .route("/api/user-details", get(api::profile::user_details))
        .route("/api/loan-eligibility", post(api::profile::loan_eligibility))
        .route("/api/predict-loan-safety", post(api::profile::predict_loan_safety))
        .route(
            "/api/profile/expenses",
            get(api::expenses::list_expenses).post(api::expenses::create_expense),
        )
        .route(
            "/api/profile/expenses/{id}",
            put(api::expenses::update_expense).delete(api::expenses::delete_expense),
        )
        // Community
        .route(
            "/api/community",
            get(api::community::list_posts).post(api::community::create_post),
        )
        .route("/api/community/{id}/like", post(api::community::like_post))
        .route("/api/community/{id}/dislike", post(api::community::dislike_post))
        // Chat
        .route("/api/chat", post(api::chat::chat))
        .route("/api/voice-chat", post(api::chat::voice_chat))
        // Admin console
        .route("/api/setup-admin", post(api::admin::setup_admin))
        .route("/admin/api/signup", post(api::admin::signup))
        .route("/admin/api/login", post(api::admin::login))
        .route("/admin/api/upload", post(api::admin::upload_pdf))
        .route("/admin/api/generate-post", get(api::admin::generate_post))
        .route("/admin/api/posts", post(api::admin::create_post))
        .route(
            "/admin/api/collections/{name}/count",
            get(api::admin::collection_count),
        )
        .route("/admin/api/config", put(api::admin::update_config))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
