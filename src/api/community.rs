use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{CommunityPost, PostView, VoteResponse};
use crate::state::AppState;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

fn allowed_image(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Stem used when nothing of the original stem survives sanitizing.
const FALLBACK_STEM: &str = "upload";

fn safe_chars(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

/// Reduce an uploaded filename to a safe single path component. The
/// extension is kept apart from the stem so it survives a non-ASCII name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, safe_chars(ext)),
        None => (base, String::new()),
    };
    let stem: String = stem
        .split('.')
        .map(safe_chars)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    let stem = stem.trim_start_matches('_');
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

struct ImageUpload {
    filename: String,
    bytes: axum::body::Bytes,
}

/// POST /api/community - Create a post, optionally with an image
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut title = None;
    let mut author = None;
    let mut description = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read image: {e}")))?;
                if filename.is_empty() {
                    tracing::warn!("No valid image file provided (empty filename)");
                } else {
                    image = Some(ImageUpload { filename, bytes });
                }
            }
            "title" | "author" | "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid form field: {e}")))?;
                let slot = match name.as_str() {
                    "title" => &mut title,
                    "author" => &mut author,
                    _ => &mut description,
                };
                *slot = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let (Some(title), Some(author), Some(description)) = (title, author, description) else {
        return Err(ApiError::bad_request(
            "Title, author, and description are required",
        ));
    };

    let image_url = match image {
        Some(upload) => Some(save_image(&state, upload).await?),
        None => None,
    };

    let post = CommunityPost::new(title, author, description, image_url);
    let post_id = post.id;
    state.posts.insert(post)?;
    tracing::info!(user_id = %user.id, %post_id, "Community post created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post_id": post_id,
        })),
    ))
}

async fn save_image(state: &AppState, upload: ImageUpload) -> ApiResult<String> {
    if !allowed_image(&upload.filename) {
        return Err(ApiError::bad_request(
            "File type not allowed. Only PNG, JPG, JPEG, and GIF are supported.",
        ));
    }
    if upload.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let unique = format!(
        "{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        sanitize_filename(&upload.filename)
    );
    let path = state.config.uploads_dir().join(&unique);
    tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
        tracing::error!("Error saving image to {}: {e}", path.display());
        ApiError::internal(format!("Failed to save image: {e}"))
    })?;

    tracing::debug!("Image saved: {}", path.display());
    Ok(format!("/uploads/{unique}"))
}

/// GET /api/community - All posts, newest first, with the caller's vote state
pub async fn list_posts(State(state): State<AppState>, user: AuthUser) -> Json<Vec<PostView>> {
    let mut posts = state.posts.all();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(
        posts
            .into_iter()
            .map(|post| PostView {
                is_liked: post.liked_by.contains(&user.id),
                is_disliked: post.disliked_by.contains(&user.id),
                post,
            })
            .collect(),
    )
}

/// Toggle `vote` for `user` on `post`, removing any opposite vote first.
pub fn apply_vote(post: &mut CommunityPost, user: Uuid, vote: Vote) {
    let (own, own_count, other, other_count) = match vote {
        Vote::Like => (
            &mut post.liked_by,
            &mut post.likes,
            &mut post.disliked_by,
            &mut post.dislikes,
        ),
        Vote::Dislike => (
            &mut post.disliked_by,
            &mut post.dislikes,
            &mut post.liked_by,
            &mut post.likes,
        ),
    };

    if let Some(pos) = other.iter().position(|id| *id == user) {
        other.remove(pos);
        *other_count = other_count.saturating_sub(1);
    }

    if let Some(pos) = own.iter().position(|id| *id == user) {
        own.remove(pos);
        *own_count = own_count.saturating_sub(1);
    } else {
        own.push(user);
        *own_count += 1;
    }
}

async fn vote(state: &AppState, user: AuthUser, raw_id: &str, vote: Vote) -> ApiResult<Json<VoteResponse>> {
    let not_found = || ApiError::not_found("Post not found");
    let post_id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;

    let post = state
        .posts
        .update(|p| p.id == post_id, |p| apply_vote(p, user.id, vote))?
        .ok_or_else(not_found)?;

    let message = match vote {
        Vote::Like => "Like toggled successfully",
        Vote::Dislike => "Dislike toggled successfully",
    };
    tracing::debug!(
        %post_id,
        likes = post.likes,
        dislikes = post.dislikes,
        "{message}"
    );

    Ok(Json(VoteResponse {
        message: message.to_string(),
        likes: post.likes,
        is_liked: post.liked_by.contains(&user.id),
        dislikes: post.dislikes,
        is_disliked: post.disliked_by.contains(&user.id),
    }))
}

/// POST /api/community/{id}/like
pub async fn like_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VoteResponse>> {
    vote(&state, user, &id, Vote::Like).await
}

/// POST /api/community/{id}/dislike
pub async fn dislike_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<VoteResponse>> {
    vote(&state, user, &id, Vote::Dislike).await
}
