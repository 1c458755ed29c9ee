use axum::extract::{Multipart, State};
use axum::Json;
use base64::Engine;

use crate::advisor::format::to_html;
use crate::advisor::Advisor;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{ChatRequest, ChatResponse, VoiceChatResponse};
use crate::state::AppState;

const AUDIO_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

fn pipeline_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Error processing chat request: {e}");
    ApiError::internal(format!(
        "Oops! Something went wrong. Please try again later. Error: {e}"
    ))
}

async fn acquire_chat_permit(state: &AppState) -> ApiResult<tokio::sync::OwnedSemaphorePermit> {
    state
        .chat_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::new(axum::http::StatusCode::SERVICE_UNAVAILABLE, "Chat service at capacity"))
}

/// POST /api/chat - Answer a loan question in the user's language, rendered as HTML
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    // ── Step 1: Validate input ───────────────────────────
    let message = req.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(ApiError::bad_request("Message required"));
    }
    tracing::info!(user_id = %user.id, "Received chat message");

    // ── Step 2: Acquire semaphore ─────────────────────────
    let _permit = acquire_chat_permit(&state).await?;

    // ── Step 3: Run the advisor pipeline ─────────────────
    let reply = Advisor::new(&state)
        .answer(user.id, &message)
        .await
        .map_err(|e| pipeline_error(format!("{e:#}")))?;

    Ok(Json(ChatResponse {
        response: to_html(&reply.raw_response),
    }))
}

fn allowed_audio(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// POST /api/voice-chat - Transcribe, answer and speak the reply
pub async fn voice_chat(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<VoiceChatResponse>> {
    // ── Step 1: Read the audio part ───────────────────────
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read audio: {e}")))?;
        audio = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = audio else {
        return Err(ApiError::bad_request("No audio file provided"));
    };
    if filename.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    if !allowed_audio(&filename) {
        return Err(ApiError::bad_request(
            "Invalid file format. Only WAV and MP3 are supported.",
        ));
    }
    tracing::info!(user_id = %user.id, size = bytes.len(), "Received voice message {filename}");

    let _permit = acquire_chat_permit(&state).await?;
    let speech = &state.config.speech;

    // ── Step 2: Speech to text ────────────────────────────
    let transcribed = state
        .speech
        .speech_to_text(&bytes, &speech.language_code)
        .await
        .map_err(pipeline_error)?;
    tracing::debug!("Transcribed audio to text: {transcribed}");

    // ── Step 3: Advisor ───────────────────────────────────
    let reply = Advisor::new(&state)
        .answer(user.id, &transcribed)
        .await
        .map_err(|e| pipeline_error(format!("{e:#}")))?;

    // ── Step 4: Text to speech ────────────────────────────
    let audio = state
        .speech
        .text_to_speech(&reply.raw_response, &speech.language_code, &speech.voice_id)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(VoiceChatResponse {
        transcribed_text: transcribed,
        response_text: reply.raw_response,
        response_audio: base64::engine::general_purpose::STANDARD.encode(audio),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_audio() {
        assert!(allowed_audio("question.wav"));
        assert!(allowed_audio("question.MP3"));
        assert!(!allowed_audio("question.ogg"));
        assert!(!allowed_audio("wav"));
    }

    #[test]
    fn test_pipeline_error_message() {
        let err = pipeline_error("boom");
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.message,
            "Oops! Something went wrong. Please try again later. Error: boom"
        );
    }
}
