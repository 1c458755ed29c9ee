//! The retrieval-augmented loan advisor.
//!
//! One call to [`Advisor::answer`] runs the whole pipeline in order:
//! detect language, translate to English, embed, search the user's profile
//! collection and the shared guidance collection, classify intent, prompt
//! the LLM and translate the reply back.

pub mod format;
pub mod intent;

use anyhow::{Context, Result};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::language::detect_language;
use crate::llm::embeddings::embed_single;
use crate::llm::generate::complete;
use crate::llm::prompts::{
    advisor_prompt, conversational_prompt, intent_question, sanitize_for_prompt,
};
use crate::speech::SarvamClient;
use crate::state::AppState;
use crate::vectors::{user_collection, VectorBackend, ADMIN_COLLECTION};
use intent::{classify, extract_profile_name, profile_name, rephrase_for_eligibility, Intent};

/// Profile chunks retrieved per question.
const PROFILE_HITS: usize = 1;
/// Guidance chunks retrieved per question.
const GUIDANCE_HITS: usize = 10;

const NO_PROFILE: &str = "No profile data available.";
const GREETING_REPLY: &str =
    "Hi there! Welcome to your loan assistant. How can I help you with your loan needs today?";
const UNKNOWN_NAME_REPLY: &str =
    "I don’t have your name yet. Please update your profile so I can assist you better!";

#[derive(Debug, Clone)]
pub struct AdvisorReply {
    /// Detected language of the user's message
    pub language: String,
    /// The message as classified, after translation and rephrasing
    pub english_message: String,
    pub intent: Intent,
    /// Reply in the user's language, still in line markup
    pub raw_response: String,
}

pub struct Advisor {
    http: reqwest::Client,
    llm: LlmConfig,
    vectors: Arc<VectorBackend>,
    speech: SarvamClient,
}

impl Advisor {
    pub fn new(state: &AppState) -> Self {
        Self {
            http: state.http_client.clone(),
            llm: state.llm(),
            vectors: state.vectors.clone(),
            speech: state.speech.clone(),
        }
    }

    /// Answer `message` for `user_id`. The message is forwarded whole; only
    /// chat-template control tokens are stripped.
    ///
    /// Both collections are searched for every intent. Small talk ignores the
    /// guidance hits.
    pub async fn answer(&self, user_id: Uuid, message: &str) -> Result<AdvisorReply> {
        let message = sanitize_for_prompt(message.trim());

        let language = detect_language(&message)?;
        tracing::debug!(%user_id, %language, "Original language detected");

        let english = self
            .speech
            .translate_to_english(&message, &language)
            .await
            .context("Error in translate_to_english")?;
        let english = rephrase_for_eligibility(&english);
        let intent = classify(&english);
        tracing::info!(%user_id, ?intent, "Classified chat message");

        let query_embedding = embed_single(&self.http, &self.llm, &english).await?;

        let profile_hits = self
            .vectors
            .search(&user_collection(user_id), &query_embedding, PROFILE_HITS)
            .await?;
        let user_profile = if profile_hits.is_empty() {
            NO_PROFILE.to_string()
        } else {
            profile_hits
                .iter()
                .map(|h| h.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let guidance = self
            .vectors
            .search(ADMIN_COLLECTION, &query_embedding, GUIDANCE_HITS)
            .await?;
        tracing::debug!("Retrieved {} guidance chunks", guidance.len());

        let response = if intent.uses_guidance() {
            let context = guidance
                .iter()
                .map(|h| h.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let question = intent_question(intent, &profile_name(&user_profile), &english);
            complete(
                &self.http,
                &self.llm,
                &advisor_prompt(&context, &user_profile, &question),
            )
            .await?
        } else {
            self.general_response(&english, &user_profile).await?
        };

        let raw_response = self.speech.translate_to_user_language(&response, &language).await;

        Ok(AdvisorReply {
            language,
            english_message: english,
            intent,
            raw_response,
        })
    }

    /// Small talk: greetings and name questions are answered locally,
    /// anything else conversationally by the LLM.
    pub async fn general_response(&self, message: &str, user_profile: &str) -> Result<String> {
        let lower = message.to_lowercase();
        if lower.contains("hi") || lower.contains("hello") {
            return Ok(GREETING_REPLY.to_string());
        }
        if lower.contains("name") && message.contains('?') {
            return Ok(match extract_profile_name(user_profile) {
                Some(name) => format!("Nice to meet you! Your name is {name}, according to your profile."),
                None => UNKNOWN_NAME_REPLY.to_string(),
            });
        }
        complete(&self.http, &self.llm, &conversational_prompt(message)).await
    }
}
