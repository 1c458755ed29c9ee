use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password, AdminUser, Role};
use crate::chunking::{chunk_words, DEFAULT_CHUNK_WORDS};
use crate::error::{ApiError, ApiResult};
use crate::llm::embeddings::embed_batch;
use crate::llm::generate::complete;
use crate::llm::prompts::{article_prompt, ARTICLE_AUTHOR};
use crate::models::{
    AdminAccount, AdminCredentials, AdminPostRequest, AdminTokenResponse, CommunityPost,
    GeneratedArticle, IngestResponse, LlmConfigResponse, LlmConfigUpdate,
};
use crate::pdf::{extract_text, is_pdf_filename};
use crate::state::AppState;
use crate::vectors::{ADMIN_COLLECTION, BOOKS_COLLECTION, UPLOAD_COLLECTIONS};

/// Reading-material chunks an article is drafted from.
const ARTICLE_CONTEXT_CHUNKS: usize = 5;

const SUPPORTED_PROVIDERS: [&str; 3] = ["gemini", "ollama", "openai"];

/// Built-in car-loan guidance seeded into the admin collection.
const SBI_GUIDANCE: [&str; 5] = [
    "General steps to apply for a car loan or auto loan with SBI: 1) Visit SBI’s website (sbi.co.in) or a branch. 2) Submit an application with personal and financial details. 3) Provide documents (ID proof, address proof, income proof). 4) SBI verifies and approves based on eligibility. 5) Loan is disbursed upon agreement.",
    "General eligibility criteria for car loans, auto loans, or vehicle loans with SBI: - Age: 18-70 years. - Nationality: Indian resident or NRI. - Income: Stable monthly income (varies by loan amount). - Credit Score: Minimum 700-750. - Debt-to-Income Ratio: Typically below 40-50%.",
    "General car loan or auto loan details with SBI: - Tenure: Up to 7 years. - Interest Rate: 8.5%-12% per annum (floating rates based on SBI Base Rate). - Pre-closure Charges: 2-3% if prepaid within 2 years.",
    "Required documents for SBI car loans, auto loans, or vehicle loans: ID proof (Aadhaar, PAN), address proof, income proof (salary slips, bank statements), vehicle quotation.",
    "Repayment options for SBI car loans or auto loans: EMI via bank account; prepayment fees may apply (0-3%).",
];

// ─── Accounts ───────────────────────────────────────────

fn credentials(req: AdminCredentials) -> ApiResult<(String, String)> {
    match (req.email, req.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Ok((email.trim().to_string(), password))
        }
        _ => Err(ApiError::bad_request("Email and password are required")),
    }
}

fn admin_token(state: &AppState, account: &AdminAccount) -> ApiResult<Json<AdminTokenResponse>> {
    let auth = &state.config.auth;
    let token = issue_token(&auth.jwt_secret, account.id, Role::Admin, auth.token_ttl_secs)
        .map_err(|e| ApiError::internal(format!("Server error: {e}")))?;
    Ok(Json(AdminTokenResponse {
        token,
        email: account.email.clone(),
    }))
}

/// POST /admin/api/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<AdminCredentials>,
) -> ApiResult<(StatusCode, Json<AdminTokenResponse>)> {
    let (email, password) = credentials(req)?;
    let password_hash =
        hash_password(&password).map_err(|e| ApiError::internal(format!("Server error: {e}")))?;

    let account = AdminAccount {
        id: Uuid::new_v4(),
        email,
        password_hash,
        created_at: Utc::now(),
    };
    let email_key = account.email.to_lowercase();
    let inserted = state
        .admins
        .insert_unique(account.clone(), |a| a.email.to_lowercase() == email_key)?;
    if !inserted {
        return Err(ApiError::conflict(
            "Email already exists. Please use a different email.",
        ));
    }
    tracing::info!(admin_id = %account.id, "Admin account created");

    Ok((StatusCode::CREATED, admin_token(&state, &account)?))
}

/// POST /admin/api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminCredentials>,
) -> ApiResult<Json<AdminTokenResponse>> {
    let (email, password) = credentials(req)?;
    let invalid = || ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password.");

    let email_key = email.to_lowercase();
    let account = state
        .admins
        .find(|a| a.email.to_lowercase() == email_key)
        .ok_or_else(invalid)?;
    if !verify_password(&password, &account.password_hash).unwrap_or(false) {
        return Err(invalid());
    }

    tracing::info!(admin_id = %account.id, "Admin logged in");
    admin_token(&state, &account)
}

// ─── Ingestion ──────────────────────────────────────────

/// Chunk, embed and append `text` to `collection`. Returns (chunks stored, collection total).
pub async fn ingest_text(state: &AppState, collection: &str, text: &str) -> anyhow::Result<(usize, usize)> {
    let chunks = chunk_words(text, DEFAULT_CHUNK_WORDS);
    if chunks.is_empty() {
        anyhow::bail!("No text to ingest");
    }
    state.vectors.ensure_collection(collection).await?;

    let embeddings = embed_batch(&state.http_client, &state.llm(), &chunks).await?;
    let stored = state.vectors.add_chunks(collection, &chunks, embeddings).await?;
    let total = state.vectors.count(collection).await?;

    tracing::info!("Ingested {stored} chunks into {collection} ({total} total)");
    Ok((stored, total))
}

async fn ingest_pdf(state: &AppState, collection: &str, bytes: &[u8]) -> anyhow::Result<(usize, usize)> {
    let text = extract_text(bytes)?;
    ingest_text(state, collection, &text).await
}

/// POST /admin/api/upload - Ingest a PDF into `Admin` or `Books_data`
pub async fn upload_pdf(
    State(state): State<AppState>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestResponse>> {
    let mut pdf = None;
    let mut collection = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                pdf = Some((filename, bytes));
            }
            "collection_name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid form field: {e}")))?;
                collection = Some(value.trim().to_string());
            }
            _ => {}
        }
    }

    let Some((filename, bytes)) = pdf else {
        return Err(ApiError::bad_request("No file part"));
    };
    if filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    let collection = collection
        .filter(|c| UPLOAD_COLLECTIONS.contains(&c.as_str()))
        .ok_or_else(|| {
            ApiError::bad_request(
                "Invalid collection name. Please select either \"Admin\" or \"Books_data\".",
            )
        })?;
    if !is_pdf_filename(&filename) {
        return Err(ApiError::bad_request(
            "Invalid file format. Please upload a PDF.",
        ));
    }
    tracing::info!(admin_id = %admin.id, "Processing {filename} for {collection}");

    let (chunks, total) = ingest_pdf(&state, &collection, &bytes).await.map_err(|e| {
        tracing::error!("Error processing PDF {filename}: {e:#}");
        ApiError::internal(format!("Error processing PDF: {e:#}"))
    })?;

    Ok(Json(IngestResponse {
        message: format!(
            "Processed and uploaded {chunks} chunks successfully to {collection}. Total objects in {collection}: {total}"
        ),
        chunks,
        total,
    }))
}

/// POST /api/setup-admin - Seed the built-in loan guidance
pub async fn setup_admin(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let (stored, _) = ingest_text(&state, ADMIN_COLLECTION, &SBI_GUIDANCE.join("\n")).await?;
    tracing::info!("Stored {stored} admin guideline chunks in {ADMIN_COLLECTION}");
    Ok(Json(json!({ "message": "Admin data initialized" })))
}

/// GET /admin/api/collections/{name}/count
pub async fn collection_count(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    if !UPLOAD_COLLECTIONS.contains(&name.as_str()) {
        return Err(ApiError::not_found(format!("Unknown collection: {name}")));
    }
    let count = state.vectors.count(&name).await?;
    Ok(Json(json!({ "collection": name, "count": count })))
}

// ─── Articles ───────────────────────────────────────────

#[derive(Deserialize)]
struct DraftArticle {
    heading: Option<String>,
    article: Option<String>,
}

/// Interpret the model's reply as an article. Replies that are not JSON are
/// kept verbatim under a generic heading; JSON missing its fields is an error.
pub fn parse_article(raw: &str) -> Result<GeneratedArticle, String> {
    let cleaned = raw.trim();
    let cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    match serde_json::from_str::<DraftArticle>(cleaned) {
        Ok(DraftArticle {
            heading: Some(heading),
            article: Some(article),
        }) if !heading.is_empty() && !article.is_empty() => Ok(GeneratedArticle {
            heading,
            author: ARTICLE_AUTHOR.to_string(),
            article,
        }),
        Ok(_) => Err("Failed to generate post".to_string()),
        Err(e) => {
            tracing::warn!("Article response is not valid JSON ({e}), using fallback");
            let text = raw.trim();
            Ok(GeneratedArticle {
                heading: "Generated Article".to_string(),
                author: ARTICLE_AUTHOR.to_string(),
                article: if text.is_empty() {
                    "No content generated.".to_string()
                } else {
                    text.to_string()
                },
            })
        }
    }
}

/// GET /admin/api/generate-post - Draft an article from the reading collection
pub async fn generate_post(State(state): State<AppState>, _admin: AdminUser) -> Json<Value> {
    let context = match state.vectors.fetch(BOOKS_COLLECTION, ARTICLE_CONTEXT_CHUNKS).await {
        Ok(hits) => {
            tracing::debug!("Fetched {} chunks from {BOOKS_COLLECTION}", hits.len());
            hits.into_iter().map(|h| h.text).collect::<Vec<_>>().join(" ")
        }
        Err(e) => {
            tracing::warn!("Error fetching data from {BOOKS_COLLECTION}: {e:#}");
            String::new()
        }
    };

    let raw = match complete(&state.http_client, &state.llm(), &article_prompt(&context)).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error generating post: {e:#}");
            return Json(json!({
                "success": false,
                "message": format!("Failed to generate post due to: {e:#}"),
            }));
        }
    };

    match parse_article(&raw) {
        Ok(article) => Json(json!({
            "success": true,
            "heading": article.heading,
            "author": article.author,
            "article": article.article,
        })),
        Err(message) => Json(json!({ "success": false, "message": message })),
    }
}

/// POST /admin/api/posts - Publish an article to the community feed
pub async fn create_post(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(req): Json<AdminPostRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(heading), Some(article), Some(author)) =
        (present(req.heading), present(req.article), present(req.author))
    else {
        return Err(ApiError::bad_request("No post data to submit."));
    };

    let post = CommunityPost::new(heading, author, article, None);
    let post_id = post.id;
    state.posts.insert(post)?;
    tracing::info!(admin_id = %admin.id, %post_id, "Inserted admin post");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully!", "post_id": post_id })),
    ))
}

// ─── Runtime config ─────────────────────────────────────

pub fn config_view(state: &AppState) -> LlmConfigResponse {
    let config = state.llm_config.read();
    LlmConfigResponse {
        provider: config.provider.clone(),
        base_url: config.base_url.clone(),
        chat_model: config.chat_model.clone(),
        embedding_model: config.embedding_model.clone(),
        temperature: config.temperature,
        has_api_key: config.api_key.is_some(),
        vector_backend: state.vectors.name().to_string(),
    }
}

/// PUT /admin/api/config - Update the runtime LLM settings
pub async fn update_config(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(update): Json<LlmConfigUpdate>,
) -> ApiResult<Json<LlmConfigResponse>> {
    if let Some(provider) = &update.provider {
        if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            return Err(ApiError::bad_request(format!(
                "Unsupported provider: {provider}"
            )));
        }
    }
    if update.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
        return Err(ApiError::bad_request("Temperature must be between 0 and 2"));
    }

    {
        let mut config = state.llm_config.write();
        if let Some(provider) = update.provider {
            config.provider = provider;
        }
        if let Some(chat_model) = update.chat_model {
            config.chat_model = chat_model;
        }
        if let Some(embedding_model) = update.embedding_model {
            config.embedding_model = embedding_model;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = Some(api_key).filter(|k| !k.is_empty());
        }
        if let Some(temperature) = update.temperature {
            config.temperature = temperature;
        }
        tracing::info!(admin_id = %admin.id, provider = %config.provider, "LLM config updated");
    }

    Ok(Json(config_view(&state)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json_forces_author() {
        let raw = "```json\n{\"heading\": \"Save first\", \"author\": \"Someone\", \"article\": \"Body\"}\n```";
        let article = parse_article(raw).unwrap();
        assert_eq!(article.heading, "Save first");
        assert_eq!(article.author, ARTICLE_AUTHOR);
        assert_eq!(article.article, "Body");
    }

    #[test]
    fn test_plain_text_falls_back() {
        let article = parse_article("Loans are useful when planned.").unwrap();
        assert_eq!(article.heading, "Generated Article");
        assert_eq!(article.article, "Loans are useful when planned.");
    }

    #[test]
    fn test_json_without_fields_fails() {
        assert_eq!(
            parse_article("{\"title\": \"x\"}").unwrap_err(),
            "Failed to generate post"
        );
    }

    #[test]
    fn test_credentials_required() {
        assert!(credentials(AdminCredentials::default()).is_err());
        let (email, _) = credentials(AdminCredentials {
            email: Some(" ops@example.com ".into()),
            password: Some("pw".into()),
        })
        .unwrap();
        assert_eq!(email, "ops@example.com");
    }

    #[test]
    fn test_guidance_mentions_tenure() {
        let joined = SBI_GUIDANCE.join("\n");
        assert!(joined.contains("Tenure: Up to 7 years"));
        assert_eq!(chunk_words(&joined, DEFAULT_CHUNK_WORDS).len(), 1);
    }
}
