use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::chunking::{chunk_words, DEFAULT_CHUNK_WORDS};
use crate::error::{ApiError, ApiResult};
use crate::llm::embeddings::embed_batch;
use crate::models::{
    EligibilityRequest, EligibilityResponse, LoanSafetyRequest, ProfileUpdate, User,
};
use crate::state::AppState;
use crate::vectors::user_collection;

/// PUT /api/profile - Update profile fields and re-index the profile text
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Value>> {
    let updated = state
        .users
        .update(
            |u| u.id == user.id,
            |u| {
                let fields = [
                    (&mut u.date_of_birth, update.date_of_birth),
                    (&mut u.gender, update.gender),
                    (&mut u.marital_status, update.marital_status),
                    (&mut u.contact_number, update.contact_number),
                    (
                        &mut u.residential_address_current,
                        update.residential_address_current,
                    ),
                    (
                        &mut u.residential_address_permanent,
                        update.residential_address_permanent,
                    ),
                    (&mut u.nationality, update.nationality),
                ];
                for (slot, value) in fields {
                    if value.is_some() {
                        *slot = value;
                    }
                }
                u.profile_completed = true;
                u.updated_at = Some(Utc::now());
            },
        )
        .map_err(|e| ApiError::from(e).as_message())?
        .ok_or_else(|| ApiError::bad_request("User not found").as_message())?;

    tracing::info!(user_id = %updated.id, "Updated profile");

    if let Err(e) = index_profile(&state, &updated).await {
        tracing::error!(user_id = %updated.id, "Error storing profile vectors: {e:#}");
    }

    Ok(Json(json!({ "user": updated.summary() })))
}

/// Replace the user's profile collection with freshly embedded profile text.
pub async fn index_profile(state: &AppState, user: &User) -> anyhow::Result<usize> {
    let collection = user_collection(user.id);
    state.vectors.clear_collection(&collection).await?;

    let chunks = chunk_words(&user.profile_text(), DEFAULT_CHUNK_WORDS);
    let embeddings = embed_batch(&state.http_client, &state.llm(), &chunks).await?;
    let stored = state.vectors.add_chunks(&collection, &chunks, embeddings).await?;

    tracing::debug!(user_id = %user.id, "Stored {stored} profile chunks in {collection}");
    Ok(stored)
}

/// GET /api/user-details
pub async fn user_details(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let record = state
        .users
        .find(|u| u.id == user.id)
        .ok_or_else(|| ApiError::not_found("User not found").as_message())?;
    Ok(Json(json!({ "userDetails": record.profile_text() })))
}

/// POST /api/loan-eligibility - Income must exceed three times the debt
pub async fn loan_eligibility(
    _user: AuthUser,
    Json(req): Json<EligibilityRequest>,
) -> Json<EligibilityResponse> {
    let eligible = req.income > req.debt * 3.0;
    Json(EligibilityResponse {
        eligible,
        message: if eligible {
            "Eligible".to_string()
        } else {
            "Not eligible based on income vs debt ratio".to_string()
        },
    })
}

/// POST /api/predict-loan-safety
pub async fn predict_loan_safety(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<LoanSafetyRequest>,
) -> ApiResult<Json<Value>> {
    if req.total_income < 0.0 || req.debt_to_income_ratio < 0.0 {
        return Err(ApiError::bad_request("Invalid input data"));
    }
    let model = state
        .loan_model
        .as_ref()
        .ok_or_else(|| ApiError::internal("Prediction model is not available"))?;

    let prediction = if model.is_safe(req.total_income, req.debt_to_income_ratio) {
        "Safe to get a loan"
    } else {
        "Not safe to get a loan"
    };
    tracing::debug!(user_id = %user.id, "Loan safety prediction: {prediction}");
    Ok(Json(json!({ "prediction": prediction })))
}
