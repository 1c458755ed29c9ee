use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered end user, as persisted in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub contact_number: Option<String>,
    pub residential_address_current: Option<String>,
    pub residential_address_permanent: Option<String>,
    pub nationality: Option<String>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Every optional profile attribute has been supplied.
    pub fn has_full_profile(&self) -> bool {
        [
            &self.date_of_birth,
            &self.gender,
            &self.marital_status,
            &self.contact_number,
            &self.residential_address_current,
            &self.residential_address_permanent,
            &self.nationality,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            profile_completed: self.profile_completed,
            requires_profile_completion: None,
        }
    }

    /// One-line profile text used for display and for the per-user vector collection.
    pub fn profile_text(&self) -> String {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        let fields = [
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("contactNumber", na(&self.contact_number)),
            ("dateOfBirth", na(&self.date_of_birth)),
            ("gender", na(&self.gender)),
            ("maritalStatus", na(&self.marital_status)),
            ("nationality", na(&self.nationality)),
            (
                "residentialAddressCurrent",
                na(&self.residential_address_current),
            ),
            (
                "residentialAddressPermanent",
                na(&self.residential_address_permanent),
            ),
        ];
        fields
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Client-safe view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_profile_completion: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub contact_number: Option<String>,
    pub residential_address_current: Option<String>,
    pub residential_address_permanent: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Profile fields sent to `PUT /api/profile`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub contact_number: Option<String>,
    pub residential_address_current: Option<String>,
    pub residential_address_permanent: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilityRequest {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub debt: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanSafetyRequest {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub debt_to_income_ratio: f64,
}

/// A community feed post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub liked_by: Vec<Uuid>,
    pub dislikes: u64,
    pub disliked_by: Vec<Uuid>,
    pub comments: u64,
}

impl CommunityPost {
    pub fn new(title: String, author: String, description: String, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author,
            description,
            image_url,
            created_at: Utc::now(),
            likes: 0,
            liked_by: Vec::new(),
            dislikes: 0,
            disliked_by: Vec::new(),
            comments: 0,
        }
    }
}

/// A post as seen by one user, with that user's vote state.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: CommunityPost,
    pub is_liked: bool,
    pub is_disliked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteResponse {
    pub message: String,
    pub likes: u64,
    pub is_liked: bool,
    pub dislikes: u64,
    pub is_disliked: bool,
}

/// One row of a user's income/expense log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub income: f64,
    pub expense: f64,
    pub savings: f64,
    pub date: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Url-encoded expense form. Values arrive as strings and are parsed by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseForm {
    pub income: Option<String>,
    pub expense: Option<String>,
    pub savings: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceChatResponse {
    pub transcribed_text: String,
    pub response_text: String,
    /// Base64-encoded synthesized audio
    pub response_audio: String,
}

/// An admin console account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminCredentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminTokenResponse {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPostRequest {
    pub heading: Option<String>,
    pub article: Option<String>,
    pub author: Option<String>,
}

/// Article drafted by the LLM from the reading collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedArticle {
    pub heading: String,
    pub author: String,
    pub article: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub message: String,
    pub chunks: usize,
    pub total: usize,
}

/// Runtime LLM settings with the API key redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfigResponse {
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub has_api_key: bool,
    pub vector_backend: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfigUpdate {
    pub provider: Option<String>,
    // base_url is fixed at startup so a changed endpoint cannot receive the key
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: "hash".into(),
            date_of_birth: None,
            gender: Some("female".into()),
            marital_status: None,
            contact_number: None,
            residential_address_current: None,
            residential_address_permanent: None,
            nationality: Some("Indian".into()),
            profile_completed: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_profile_text_fills_missing_with_na() {
        let text = sample_user().profile_text();
        assert!(text.starts_with("name: Asha, email: asha@example.com, contactNumber: N/A"));
        assert!(text.contains("gender: female"));
        assert!(text.contains("nationality: Indian"));
    }

    #[test]
    fn test_partial_profile_is_not_complete() {
        assert!(!sample_user().has_full_profile());
    }

    #[test]
    fn test_full_profile_is_complete() {
        let mut user = sample_user();
        user.date_of_birth = Some("1990-01-01".into());
        user.marital_status = Some("single".into());
        user.contact_number = Some("999".into());
        user.residential_address_current = Some("Chennai".into());
        user.residential_address_permanent = Some("Madurai".into());
        assert!(user.has_full_profile());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("profileCompleted").is_some());
        assert!(json.get("dateOfBirth").is_some());
    }

    #[test]
    fn test_post_view_flattens_post_with_id_alias() {
        let post = CommunityPost::new("t".into(), "a".into(), "d".into(), None);
        let id = post.id;
        let view = PostView {
            post,
            is_liked: true,
            is_disliked: false,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["_id"], id.to_string());
        assert_eq!(json["is_liked"], true);
        assert_eq!(json["likes"], 0);
    }
}
