//! Client for the Sarvam translation, speech-to-text and text-to-speech APIs.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SpeechConfig;
use crate::language::{is_supported, sarvam_code};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest input the translate endpoint accepts in one request.
pub const MAX_TRANSLATE_CHARS: usize = 900;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("SARVAM_API_KEY not set")]
    ApiKeyNotSet,

    #[error("{endpoint} API error: {status} - {body}")]
    Api {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} API returned an empty result")]
    Empty(&'static str),

    #[error("Invalid audio payload: {0}")]
    Audio(#[from] base64::DecodeError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    input: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: Option<String>,
    output: Option<String>,
}

#[derive(Serialize)]
struct SttRequest<'a> {
    audio: String,
    language_code: &'a str,
}

#[derive(Deserialize)]
struct SttResponse {
    #[serde(default)]
    transcription: String,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    language_code: &'a str,
    voice_id: &'a str,
}

#[derive(Deserialize)]
struct TtsResponse {
    #[serde(default)]
    audio: String,
}

#[derive(Debug, Clone)]
pub struct SarvamClient {
    http: Client,
    api_key: Option<ApiKey>,
    base_url: String,
}

impl SarvamClient {
    pub fn new(http: Client, config: &SpeechConfig) -> Self {
        Self {
            http,
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| ApiKey(k.to_string())),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &Req,
    ) -> Result<Resp, SpeechError> {
        let key = self.api_key.as_ref().ok_or(SpeechError::ApiKeyNotSet)?;
        let url = format!("{}/{endpoint}", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("api-subscription-key", &key.0)
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = %status, "Sarvam API error");
            return Err(SpeechError::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, SpeechError> {
        let mut translated = Vec::new();
        for piece in split_chars(text, MAX_TRANSLATE_CHARS) {
            let request = TranslateRequest {
                input: &piece,
                source_language_code: source,
                target_language_code: target,
            };
            debug!(source, target, chars = piece.chars().count(), "Sending translation request");
            let resp: TranslateResponse = self.post("translate", &request).await?;
            let text = resp
                .translated_text
                .or(resp.output)
                .filter(|t| !t.is_empty())
                .ok_or(SpeechError::Empty("translate"))?;
            translated.push(text);
        }
        Ok(translated.join(" "))
    }

    /// Translate user input into English. English and unsupported languages pass through.
    pub async fn translate_to_english(&self, text: &str, source_lang: &str) -> Result<String, SpeechError> {
        if source_lang == "en" {
            return Ok(text.to_string());
        }
        if !is_supported(source_lang) {
            warn!("Language '{source_lang}' is not supported by Sarvam API. Returning original text");
            return Ok(text.to_string());
        }
        self.translate(text, &sarvam_code(source_lang), "en-IN").await
    }

    /// Translate an English reply back into the user's language.
    ///
    /// Never fails: on error the English text is returned with a notice.
    pub async fn translate_to_user_language(&self, text: &str, target_lang: &str) -> String {
        if target_lang == "en" {
            return text.to_string();
        }
        if !is_supported(target_lang) {
            warn!("Cannot translate reply into unsupported language '{target_lang}'");
            return translation_fallback(text);
        }
        match self.translate(text, "en-IN", &sarvam_code(target_lang)).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Error translating response to {target_lang}: {e}");
                translation_fallback(text)
            }
        }
    }

    pub async fn speech_to_text(&self, audio: &[u8], language_code: &str) -> Result<String, SpeechError> {
        let request = SttRequest {
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            language_code,
        };
        let resp: SttResponse = self.post("speech-to-text", &request).await?;
        if resp.transcription.trim().is_empty() {
            return Err(SpeechError::Empty("speech-to-text"));
        }
        debug!("STT successful: {} chars", resp.transcription.len());
        Ok(resp.transcription)
    }

    /// Synthesize `text`, returning the raw audio bytes.
    pub async fn text_to_speech(
        &self,
        text: &str,
        language_code: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            text,
            language_code,
            voice_id,
        };
        let resp: TtsResponse = self.post("text-to-speech", &request).await?;
        if resp.audio.is_empty() {
            return Err(SpeechError::Empty("text-to-speech"));
        }
        let audio = base64::engine::general_purpose::STANDARD.decode(resp.audio.as_bytes())?;
        debug!("TTS successful: {} bytes", audio.len());
        Ok(audio)
    }
}

fn translation_fallback(text: &str) -> String {
    format!("Translation failed, response in English: {text}")
}

/// Split on char boundaries into pieces of at most `max_chars` characters.
fn split_chars(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_char_boundaries() {
        let text = "கார்".repeat(500);
        let pieces = split_chars(&text, MAX_TRANSLATE_CHARS);
        assert_eq!(pieces.concat(), text);
        assert!(pieces.iter().all(|p| p.chars().count() <= MAX_TRANSLATE_CHARS));
        assert_eq!(pieces.len(), text.chars().count().div_ceil(MAX_TRANSLATE_CHARS));
    }

    #[test]
    fn test_short_text_is_single_piece() {
        assert_eq!(split_chars("hello", 900), vec!["hello".to_string()]);
    }
}
