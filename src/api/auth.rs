use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password, Role};
use crate::error::{ApiError, ApiResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::state::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn user_token(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let auth = &state.config.auth;
    issue_token(&auth.jwt_secret, user_id, Role::User, auth.token_ttl_secs)
        .map_err(|e| ApiError::internal(format!("Server error: {e}")).as_message())
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(name), Some(email), Some(password)) = (
        non_empty(req.name),
        non_empty(req.email),
        non_empty(req.password),
    ) else {
        return Err(ApiError::bad_request("Missing required fields: name, email, password").as_message());
    };
    let email = email.trim().to_string();

    let password_hash = hash_password(&password)
        .map_err(|e| ApiError::internal(format!("Server error: {e}")).as_message())?;

    let mut user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash,
        date_of_birth: non_empty(req.date_of_birth),
        gender: non_empty(req.gender),
        marital_status: non_empty(req.marital_status),
        contact_number: non_empty(req.contact_number),
        residential_address_current: non_empty(req.residential_address_current),
        residential_address_permanent: non_empty(req.residential_address_permanent),
        nationality: non_empty(req.nationality),
        profile_completed: false,
        created_at: Utc::now(),
        updated_at: None,
    };
    user.profile_completed = user.has_full_profile();

    let email_key = user.email.to_lowercase();
    let inserted = state
        .users
        .insert_unique(user.clone(), |u| u.email.to_lowercase() == email_key)
        .map_err(|e| ApiError::from(e).as_message())?;
    if !inserted {
        return Err(ApiError::bad_request("User already exists").as_message());
    }
    tracing::info!(user_id = %user.id, "Registered user");

    let token = user_token(&state, user.id)?;
    let mut summary = user.summary();
    summary.requires_profile_completion = Some(!user.profile_completed);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: summary,
        }),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
        return Err(ApiError::bad_request("Missing required fields: email, password").as_message());
    };
    let email_key = email.trim().to_lowercase();

    let invalid = || ApiError::bad_request("Invalid credentials").as_message();
    let user = state
        .users
        .find(|u| u.email.to_lowercase() == email_key)
        .ok_or_else(invalid)?;

    let valid = verify_password(&password, &user.password_hash).map_err(|e| {
        tracing::error!(user_id = %user.id, "Stored password hash unreadable: {e}");
        invalid()
    })?;
    if !valid {
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse {
        token: user_token(&state, user.id)?,
        user: user.summary(),
    }))
}
