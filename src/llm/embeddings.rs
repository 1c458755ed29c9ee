use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chunking::DEFAULT_CHUNK_WORDS;
use crate::config::LlmConfig;

/// Longest text sent to the embedding API, in chars. Sized so a full chunk
/// of long words in any script fits uncut.
const MAX_EMBED_CHARS: usize = DEFAULT_CHUNK_WORDS * 24;

const GEMINI_BATCH: usize = 100;
const OLLAMA_BATCH: usize = 32;
const OPENAI_BATCH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmbedTask {
    Document,
    Query,
}

impl EmbedTask {
    fn gemini_task_type(self) -> &'static str {
        match self {
            EmbedTask::Document => "RETRIEVAL_DOCUMENT",
            EmbedTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

fn truncate_for_embedding(text: &str) -> &str {
    match text.char_indices().nth(MAX_EMBED_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// POST `body` and decode a JSON reply, naming `provider` in every error.
async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    body: &B,
    provider: &str,
) -> Result<T> {
    let resp = request
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to call {provider} embed API"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{provider} embed API returned {status}: {body}");
    }

    resp.json()
        .await
        .with_context(|| format!("Failed to parse {provider} embed response"))
}

/// Embed a batch of stored documents (profile text, PDF chunks).
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    embed(client, config, texts, EmbedTask::Document).await
}

/// Embed a single search query.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let results = embed(client, config, &[text.to_string()], EmbedTask::Query).await?;
    results
        .into_iter()
        .next()
        .context("No embedding returned")
}

async fn embed(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
    task: EmbedTask,
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let truncated: Vec<String> = texts
        .iter()
        .map(|t| truncate_for_embedding(t).to_string())
        .collect();

    let embeddings = match config.provider.as_str() {
        "gemini" => embed_gemini(client, config, &truncated, task).await?,
        "ollama" => embed_ollama(client, config, &truncated).await?,
        "openai" => embed_openai(client, config, &truncated).await?,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    if embeddings.len() != texts.len() {
        anyhow::bail!(
            "Embedding API returned {} vectors for {} inputs",
            embeddings.len(),
            texts.len()
        );
    }
    Ok(embeddings)
}

// ─── Gemini ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedRequest {
    model: String,
    content: GeminiContent,
    task_type: &'static str,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiBatchRequest {
    requests: Vec<GeminiEmbedRequest>,
}

#[derive(Deserialize)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

async fn embed_gemini(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
    task: EmbedTask,
) -> Result<Vec<Vec<f32>>> {
    let model = config.embedding_model.trim_start_matches("models/");
    let url = format!("{}/models/{model}:batchEmbedContents", config.base_url);
    let api_key = config
        .api_key
        .as_deref()
        .context("GOOGLE_API_KEY not set")?;

    // batchEmbedContents accepts at most 100 requests per call
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(GEMINI_BATCH) {
        let req = GeminiBatchRequest {
            requests: batch
                .iter()
                .map(|text| GeminiEmbedRequest {
                    model: format!("models/{model}"),
                    content: GeminiContent {
                        parts: vec![GeminiPart { text: text.clone() }],
                    },
                    task_type: task.gemini_task_type(),
                })
                .collect(),
        };
        let body: GeminiBatchResponse =
            post_json(client.post(&url).header("x-goog-api-key", api_key), &req, "Gemini").await?;
        vectors.extend(body.embeddings.into_iter().map(|e| e.values));
    }
    Ok(vectors)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Deserialize)]
struct OllamaVectors {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", config.base_url);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(OLLAMA_BATCH) {
        let body = json!({
            "model": config.embedding_model,
            "input": batch,
            "truncate": true,
        });
        let reply: OllamaVectors = post_json(client.post(&url), &body, "Ollama").await?;
        vectors.extend(reply.embeddings);
    }
    Ok(vectors)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Deserialize)]
struct OpenAiVectors {
    data: Vec<OpenAiVector>,
}

#[derive(Deserialize)]
struct OpenAiVector {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(OPENAI_BATCH) {
        let mut request = client.post(&url);
        if let Some(key) = config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let body = json!({
            "model": config.embedding_model,
            "input": batch,
            "encoding_format": "float",
        });
        let mut reply: OpenAiVectors = post_json(request, &body, "OpenAI").await?;
        // Items carry their input position; keep vectors aligned with `batch`.
        reply.data.sort_by_key(|item| item.index);
        vectors.extend(reply.data.into_iter().map(|item| item.embedding));
    }
    Ok(vectors)
}
