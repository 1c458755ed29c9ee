//! Minimal Weaviate REST client: schema management, object creation and
//! GraphQL `nearVector` / `Aggregate` queries.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::VectorHit;

#[derive(Debug, thiserror::Error)]
pub enum WeaviateError {
    #[error("Weaviate API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Weaviate GraphQL error: {0}")]
    GraphQl(String),

    #[error("Unexpected Weaviate response: {0}")]
    Malformed(String),

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
struct ObjectRequest<'a> {
    class: &'a str,
    properties: ObjectProperties<'a>,
    vector: &'a [f32],
}

#[derive(Serialize)]
struct ObjectProperties<'a> {
    text: &'a str,
    sequence: usize,
}

#[derive(Debug, Clone)]
pub struct WeaviateClient {
    http: Client,
    base_url: String,
    api_key: Option<ApiKey>,
}

impl WeaviateClient {
    pub fn new(http: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()).map(ApiKey),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.bearer_auth(&key.0),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, WeaviateError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Weaviate API error");
        Err(WeaviateError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Create the class if it does not exist yet. Vectors are always supplied by us.
    pub async fn ensure_collection(&self, class: &str) -> Result<(), WeaviateError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/schema/{class}"))
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Self::check(response).await.map(|_| ());
        }

        let schema = json!({
            "class": class,
            "vectorizer": "none",
            "properties": [
                {"name": "text", "dataType": ["text"]},
                {"name": "sequence", "dataType": ["int"]}
            ]
        });
        let response = self
            .request(reqwest::Method::POST, "/v1/schema")
            .json(&schema)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Created Weaviate class: {class}");
        Ok(())
    }

    /// Drop the class with all of its objects. A missing class is not an error.
    pub async fn delete_collection(&self, class: &str) -> Result<(), WeaviateError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v1/schema/{class}"))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        debug!("Deleted Weaviate class: {class}");
        Ok(())
    }

    pub async fn add_object(
        &self,
        class: &str,
        text: &str,
        sequence: usize,
        vector: &[f32],
    ) -> Result<(), WeaviateError> {
        let body = ObjectRequest {
            class,
            properties: ObjectProperties { text, sequence },
            vector,
        };
        let response = self
            .request(reqwest::Method::POST, "/v1/objects")
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn graphql(&self, query: String) -> Result<Option<Value>, WeaviateError> {
        let response = self
            .request(reqwest::Method::POST, "/v1/graphql")
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            // Querying a class that was never created fails schema validation.
            if messages.iter().any(|m| m.contains("Cannot query field")) {
                return Ok(None);
            }
            if !messages.is_empty() {
                return Err(WeaviateError::GraphQl(messages.join("; ")));
            }
        }
        Ok(Some(body))
    }

    pub async fn near_vector(
        &self,
        class: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>, WeaviateError> {
        let vector = serde_json::to_string(vector).map_err(|e| WeaviateError::Malformed(e.to_string()))?;
        let query = format!(
            "{{ Get {{ {class}(nearVector: {{vector: {vector}}}, limit: {limit}) \
             {{ text sequence _additional {{ distance }} }} }} }}"
        );
        let Some(body) = self.graphql(query).await? else {
            return Ok(Vec::new());
        };
        parse_hits(&body, class)
    }

    /// First `limit` objects of the class ordered by `sequence`.
    pub async fn fetch_ordered(&self, class: &str, limit: usize) -> Result<Vec<VectorHit>, WeaviateError> {
        let query = format!(
            "{{ Get {{ {class}(limit: {limit}, sort: [{{path: [\"sequence\"], order: asc}}]) \
             {{ text sequence }} }} }}"
        );
        let Some(body) = self.graphql(query).await? else {
            return Ok(Vec::new());
        };
        let mut hits = parse_hits(&body, class)?;
        hits.sort_by_key(|h| h.sequence);
        Ok(hits)
    }

    pub async fn count(&self, class: &str) -> Result<usize, WeaviateError> {
        let query = format!("{{ Aggregate {{ {class} {{ meta {{ count }} }} }} }}");
        let Some(body) = self.graphql(query).await? else {
            return Ok(0);
        };
        let count = body
            .pointer(&format!("/data/Aggregate/{class}/0/meta/count"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(count as usize)
    }
}

fn parse_hits(body: &Value, class: &str) -> Result<Vec<VectorHit>, WeaviateError> {
    let Some(items) = body.pointer(&format!("/data/Get/{class}")) else {
        return Err(WeaviateError::Malformed(format!("missing data.Get.{class}")));
    };
    let Some(items) = items.as_array() else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .map(|item| {
            let distance = item
                .pointer("/_additional/distance")
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            VectorHit {
                text: item
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                sequence: item.get("sequence").and_then(Value::as_u64).unwrap_or(0) as usize,
                score: (1.0 - distance) as f32,
            }
        })
        .collect())
}
