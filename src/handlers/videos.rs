// Video listing and assignment handlers: folder listings normalized
// with their decoded metadata, the per-user "My Recordings" view, and
// the video-to-user assignment endpoints.

use crate::assignments::VideoAssignment;
use crate::error::ApiError;
use crate::metadata::{extract_video_metadata, strip_metadata_block};
use crate::models::vimeo::VideoRecord;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn video_routes() -> Router {
    Router::new()
        .route("/api/folder-videos", get(folder_videos))
        .route("/api/all-user-videos/:email", get(all_user_videos))
        .route("/api/assign-video", post(assign_video))
        .route("/api/video-assignments/:user_id", get(video_assignments))
        .route("/api/user-videos/:user_id", get(user_videos))
}

/// A video reshaped for the UI: decoded metadata fields flattened next
/// to the playback link and thumbnail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVideo {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub recorded_by: String,
    pub recorded_by_email: String,
    pub recording_date: String,
    pub description: String,
    pub vimeo_link: Option<String>,
    pub thumbnail: Option<String>,
    pub created_time: Option<String>,
}

fn normalize_video(video: &VideoRecord) -> NormalizedVideo {
    let description = video.description.as_deref().unwrap_or("");
    let metadata = extract_video_metadata(description);
    let free_text = strip_metadata_block(description);

    NormalizedVideo {
        id: video.video_id().to_string(),
        customer_name: metadata
            .customer
            .or_else(|| video.name.clone())
            .unwrap_or_else(|| "Unknown Customer".to_string()),
        customer_email: metadata
            .customer_email
            .unwrap_or_else(|| "No email".to_string()),
        recorded_by: metadata.recorded_by.unwrap_or_else(|| "Unknown".to_string()),
        recorded_by_email: metadata.recorded_by_email.unwrap_or_default(),
        recording_date: metadata
            .recording_date
            .or_else(|| video.created_time.clone())
            .unwrap_or_default(),
        description: if free_text.is_empty() {
            "No description available".to_string()
        } else {
            free_text
        },
        vimeo_link: video.link.clone(),
        thumbnail: video.pictures.as_ref().and_then(|p| p.base_link.clone()),
        created_time: video.created_time.clone(),
    }
}

/// Every video in the configured folder, newest first.
async fn folder_videos(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let vimeo = state.vimeo()?;
    let videos = vimeo.fetch_folder_videos(&state.folder_query()).await?;
    let mut normalized: Vec<NormalizedVideo> = videos.iter().map(normalize_video).collect();
    sort_newest_first(&mut normalized);
    Ok(Json(json!({ "videos": normalized, "total": normalized.len() })))
}

/// Every video recorded by the given user, matched on the
/// `Recorded By Email` metadata line, newest first.
async fn all_user_videos(
    Path(email): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let vimeo = state.vimeo()?;
    let videos = vimeo.fetch_folder_videos(&state.folder_query()).await?;
    let needle = email.trim().to_lowercase();

    let mut matching: Vec<NormalizedVideo> = videos
        .iter()
        .map(normalize_video)
        .filter(|video| video.recorded_by_email.trim().to_lowercase() == needle)
        .collect();
    sort_newest_first(&mut matching);

    tracing::info!(email = %email, count = matching.len(), "user videos resolved");
    Ok(Json(json!(matching)))
}

fn sort_newest_first(videos: &mut [NormalizedVideo]) {
    videos.sort_by(|a, b| b.created_time.cmp(&a.created_time));
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVideoRequest {
    pub video_uri: Option<String>,
    pub video_title: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Assign a video to a user. The recording stays in the main folder;
/// the assignment only drives the per-user views.
async fn assign_video(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<AssignVideoRequest>,
) -> Result<Json<Value>, ApiError> {
    let video_uri = body
        .video_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| ApiError::Validation("videoUri and userId are required".to_string()))?;
    let user_id = body
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("videoUri and userId are required".to_string()))?;

    let assignment = VideoAssignment::new(
        video_uri.to_string(),
        body.video_title.clone(),
        user_id.to_string(),
        body.user_name.clone(),
        body.user_email.clone(),
    );
    let video_id = assignment.video_id.clone();
    state.assignments.set(assignment).await;

    let count = state.assignments.list_for_user(user_id).await.len();
    tracing::info!(video_id = %video_id, user_id = %user_id, "video assigned");
    Ok(Json(json!({
        "success": true,
        "videoId": video_id,
        "userVideoCount": count,
    })))
}

async fn video_assignments(
    Path(user_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Value> {
    let assignments = state.assignments.list_for_user(&user_id).await;
    Json(json!({ "success": true, "assignments": assignments }))
}

async fn user_videos(
    Path(user_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Value> {
    let assignments = state.assignments.list_for_user(&user_id).await;
    let videos: Vec<String> = assignments
        .iter()
        .map(|assignment| assignment.video_uri.clone())
        .collect();
    Json(json!({ "success": true, "videos": videos, "count": videos.len() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_flattens_metadata_with_fallbacks() {
        let video = VideoRecord {
            uri: "/videos/42".to_string(),
            name: Some("Fallback Title".to_string()),
            description: Some(
                "Customer Email: a@x.com\nRecorded By: Bob\nRecorded By Email: bob@corp.com\n\nWalkthrough."
                    .to_string(),
            ),
            link: Some("https://vimeo.com/42".to_string()),
            created_time: Some("2026-02-01T00:00:00+00:00".to_string()),
            pictures: None,
        };
        let normalized = normalize_video(&video);
        assert_eq!(normalized.id, "42");
        assert_eq!(normalized.customer_name, "Fallback Title");
        assert_eq!(normalized.customer_email, "a@x.com");
        assert_eq!(normalized.recorded_by, "Bob");
        assert_eq!(normalized.recorded_by_email, "bob@corp.com");
        assert_eq!(normalized.description, "Walkthrough.");
    }

    #[test]
    fn normalization_defaults_when_metadata_is_absent() {
        let video = VideoRecord {
            uri: "/videos/7".to_string(),
            name: None,
            description: None,
            link: None,
            created_time: None,
            pictures: None,
        };
        let normalized = normalize_video(&video);
        assert_eq!(normalized.customer_name, "Unknown Customer");
        assert_eq!(normalized.customer_email, "No email");
        assert_eq!(normalized.recorded_by, "Unknown");
        assert_eq!(normalized.description, "No description available");
    }

    #[test]
    fn newest_first_ordering() {
        let mut videos: Vec<NormalizedVideo> = ["2026-01-01", "2026-03-01", "2026-02-01"]
            .iter()
            .map(|date| NormalizedVideo {
                id: String::new(),
                customer_name: String::new(),
                customer_email: String::new(),
                recorded_by: String::new(),
                recorded_by_email: String::new(),
                recording_date: String::new(),
                description: String::new(),
                vimeo_link: None,
                thumbnail: None,
                created_time: Some(format!("{}T00:00:00+00:00", date)),
            })
            .collect();
        sort_newest_first(&mut videos);
        let order: Vec<&str> = videos
            .iter()
            .map(|v| &v.created_time.as_deref().unwrap()[..10])
            .collect();
        assert_eq!(order, vec!["2026-03-01", "2026-02-01", "2026-01-01"]);
    }
}
