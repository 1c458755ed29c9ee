use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEV_JWT_SECRET: &str = "loan-advisor-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where JSON collections, local vectors and uploads are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Maximum request body size for multipart uploads, in MB
    pub max_upload_mb: usize,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub vector: VectorConfig,
    pub speech: SpeechConfig,
    /// JSON file holding the loan-safety logistic regression weights
    pub loan_model_path: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answers and article generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (Gemini and hosted OpenAI-compatible providers)
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Hosted vector index. Without a URL the local JSON-backed store is used.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct VectorConfig {
    pub weaviate_url: Option<String>,
    pub weaviate_api_key: Option<String>,
}

impl std::fmt::Debug for VectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorConfig")
            .field("weaviate_url", &self.weaviate_url)
            .field(
                "weaviate_api_key",
                &self.weaviate_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Language assumed for uploaded voice messages and synthesized replies
    pub language_code: String,
    pub voice_id: String,
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("language_code", &self.language_code)
            .field("voice_id", &self.voice_id)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:5001".to_string(),
            max_upload_mb: 16,
            auth: AuthConfig::default(),
            llm: LlmConfig::default(),
            vector: VectorConfig::default(),
            speech: SpeechConfig::default(),
            loan_model_path: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: 3600,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-1.5-pro".to_string(),
            embedding_model: "embedding-001".to_string(),
            api_key: None,
            temperature: 0.2,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sarvam.ai".to_string(),
            api_key: None,
            language_code: "ta-IN".to_string(),
            voice_id: "default".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LOAN_ADVISOR_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("LOAN_ADVISOR_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("LOAN_ADVISOR_MAX_UPLOAD_MB") {
            if let Ok(v) = val.parse() {
                config.max_upload_mb = v;
            }
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                config.auth.jwt_secret = secret;
            }
        }
        if let Ok(val) = std::env::var("JWT_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.auth.token_ttl_secs = v;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY").or_else(|_| std::env::var("LLM_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                config.llm.temperature = v;
            }
        }

        if let Ok(url) = std::env::var("WEAVIATE_URL") {
            if !url.trim().is_empty() {
                config.vector.weaviate_url = Some(url.trim_end_matches('/').to_string());
            }
        }
        if let Ok(key) = std::env::var("WEAVIATE_API_KEY") {
            config.vector.weaviate_api_key = Some(key);
        }

        if let Ok(url) = std::env::var("SARVAM_BASE_URL") {
            config.speech.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var("SARVAM_API_KEY") {
            config.speech.api_key = Some(key);
        }
        if let Ok(code) = std::env::var("SARVAM_SPEECH_LANGUAGE") {
            config.speech.language_code = code;
        }
        if let Ok(voice) = std::env::var("SARVAM_VOICE_ID") {
            config.speech.voice_id = voice;
        }

        if let Ok(path) = std::env::var("LOAN_SAFETY_MODEL_PATH") {
            config.loan_model_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    /// Path of the JSON file backing a document collection.
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_live_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/advisor"),
            ..Config::default()
        };
        assert_eq!(config.uploads_dir(), PathBuf::from("/tmp/advisor/uploads"));
        assert_eq!(config.vector_dir(), PathBuf::from("/tmp/advisor/vectors"));
        assert_eq!(
            config.collection_path("users"),
            PathBuf::from("/tmp/advisor/users.json")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.llm.api_key = Some("super-secret-key".into());
        config.speech.api_key = Some("sarvam-secret".into());
        config.auth.jwt_secret = "jwt-secret".into();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("sarvam-secret"));
        assert!(!rendered.contains("jwt-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_default_secret_is_flagged() {
        assert!(AuthConfig::default().uses_dev_secret());
    }
}
