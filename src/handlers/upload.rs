// Upload handlers. Two paths share one endpoint: a resumable (tus)
// ticket request carrying `title` + `size`, and a direct upload carrying
// the whole payload base64-encoded. Both run the registry
// email-uniqueness guard before any remote call, and the finalize step
// patches metadata, files the video into the folder, and registers the
// customer best-effort.

use crate::error::ApiError;
use crate::metadata::{build_metadata, MetadataFields};
use crate::models::customer::RegistryCustomer;
use crate::models::vimeo::UploadTicket;
use crate::supabase_client::SupabaseClient;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Extension},
    response::Json,
    routing::post,
    Router,
};
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn upload_routes() -> Router {
    Router::new()
        .route("/api/upload-vimeo", post(upload_vimeo))
        .route("/api/finalize-vimeo", post(finalize_vimeo))
        .layer(DefaultBodyLimit::max(200 * 1024 * 1024)) // direct uploads carry the whole recording
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub title: Option<String>,
    /// Resumable path: file size in bytes.
    pub size: Option<u64>,
    /// Direct path: base64-encoded payload.
    pub video_data: Option<String>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_by_email: Option<String>,
    pub folder_id: Option<String>,
    #[serde(default)]
    pub is_existing_customer: bool,
    #[serde(default)]
    pub force_existing_customer: bool,
}

/// The guard applies when the email is already registered and the
/// caller did not acknowledge it with either flag.
fn conflict_guard_applies(already_registered: bool, request: &UploadRequest) -> bool {
    already_registered && !request.is_existing_customer && !request.force_existing_customer
}

async fn run_conflict_guard(
    state: &AppState,
    request: &UploadRequest,
) -> Result<(), ApiError> {
    let Some(email) = request
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
    else {
        return Ok(());
    };
    let Some(registry) = state.registry.as_ref() else {
        // No registry configured: nothing to check against.
        return Ok(());
    };

    let existing = registry.find_customer_by_email(email).await?;
    if let Some(existing) = existing {
        if conflict_guard_applies(true, request) {
            tracing::warn!(email = %email, "upload blocked: customer email already registered");
            return Err(ApiError::Conflict {
                existing: serde_json::to_value(existing).unwrap_or(Value::Null),
            });
        }
    }
    Ok(())
}

async fn upload_vimeo(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<UploadRequest>,
) -> Result<Json<Value>, ApiError> {
    let vimeo = state.vimeo()?;

    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing required fields: title".to_string()))?;

    run_conflict_guard(&state, &body).await?;

    let description = build_metadata(&MetadataFields {
        description: body.description.clone(),
        customer_name: body.customer_name.clone(),
        customer_email: body.customer_email.clone(),
        recorded_by: body.recorded_by.clone(),
        recorded_by_email: body.recorded_by_email.clone(),
    });
    let folder_id = body
        .folder_id
        .clone()
        .unwrap_or_else(|| state.folder_id.clone());

    if let Some(video_data) = body.video_data.as_deref() {
        // Direct path: decode, create a post ticket, push the bytes.
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(video_data)
            .map_err(|_| ApiError::Validation("videoData is not valid base64".to_string()))?;
        let mime_type = body.mime_type.as_deref().unwrap_or("video/webm");
        tracing::info!(title = %title, size_kb = bytes.len() / 1024, "starting direct upload");

        let (upload_link, video_uri) = vimeo
            .create_post_upload(title, bytes.len() as u64, &description)
            .await?;
        vimeo
            .upload_video_bytes(&upload_link, bytes, mime_type)
            .await?;

        let video_id = video_uri
            .rsplit('/')
            .next()
            .unwrap_or(video_uri.as_str())
            .to_string();

        // Filing and registration are best-effort: the recording is
        // already uploaded, so later failures only get logged.
        if let Err(err) = vimeo
            .move_to_folder(&state.owner_id, &folder_id, &video_id)
            .await
        {
            tracing::warn!(error = %err, "failed to move video to folder, upload kept");
        }
        register_customer_best_effort(state.registry.as_ref(), &body, &video_uri).await;

        tracing::info!(video_id = %video_id, "direct upload completed");
        return Ok(Json(json!({
            "success": true,
            "vimeoUrl": format!("https://vimeo.com/{}", video_id),
            "videoId": video_id,
        })));
    }

    // Resumable path: hand the browser a tus upload link.
    let size = body
        .size
        .ok_or_else(|| ApiError::Validation("Missing required fields: title, size".to_string()))?;
    let (upload_link, video_uri) = vimeo.create_tus_upload(title, size, &description).await?;
    let video_id = video_uri
        .rsplit('/')
        .next()
        .unwrap_or(video_uri.as_str())
        .to_string();

    tracing::info!(video_id = %video_id, size, "resumable upload ticket issued");
    Ok(Json(json!(UploadTicket {
        success: true,
        upload_link,
        video_uri,
        video_id,
        folder_id,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub video_uri: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_by_email: Option<String>,
    pub folder_id: Option<String>,
}

/// Finalize a resumable upload: rewrite the description with the
/// labeled metadata block, file the video into the folder, and register
/// the customer. The registry step never fails the request.
async fn finalize_vimeo(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<FinalizeRequest>,
) -> Result<Json<Value>, ApiError> {
    let vimeo = state.vimeo()?;

    let video_uri = body
        .video_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing videoUri".to_string()))?;
    let video_id = video_uri.rsplit('/').next().unwrap_or(video_uri);

    let description = build_metadata(&MetadataFields {
        description: body.description.clone(),
        customer_name: body.customer_name.clone(),
        customer_email: body.customer_email.clone(),
        recorded_by: body.recorded_by.clone(),
        recorded_by_email: body.recorded_by_email.clone(),
    });

    vimeo
        .patch_video(video_id, body.title.as_deref(), Some(&description))
        .await?;

    let folder_id = body
        .folder_id
        .clone()
        .unwrap_or_else(|| state.folder_id.clone());
    vimeo
        .move_to_folder(&state.owner_id, &folder_id, video_id)
        .await?;

    let upload = UploadRequest {
        title: body.title.clone(),
        size: None,
        video_data: None,
        mime_type: None,
        description: body.description.clone(),
        customer_name: body.customer_name.clone(),
        customer_email: body.customer_email.clone(),
        recorded_by: body.recorded_by.clone(),
        recorded_by_email: body.recorded_by_email.clone(),
        folder_id: body.folder_id.clone(),
        is_existing_customer: true,
        force_existing_customer: false,
    };
    register_customer_best_effort(state.registry.as_ref(), &upload, video_uri).await;

    tracing::info!(video_id = %video_id, folder_id = %folder_id, "upload finalized");
    Ok(Json(json!({
        "success": true,
        "videoId": video_id,
        "vimeoUrl": format!("https://vimeo.com/{}", video_id),
    })))
}

/// Upsert the customer row after a successful upload. Failures are
/// logged, never propagated: the video is already stored.
async fn register_customer_best_effort(
    registry: Option<&SupabaseClient>,
    request: &UploadRequest,
    video_uri: &str,
) {
    let Some(registry) = registry else {
        return;
    };
    let Some(email) = request
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
    else {
        return;
    };
    let normalized = email.to_lowercase();

    let mut videos = match registry.find_customer_by_email(&normalized).await {
        Ok(Some(existing)) => existing.videos.unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "registry lookup failed during registration");
            Vec::new()
        }
    };
    if !videos.iter().any(|uri| uri == video_uri) {
        videos.push(video_uri.to_string());
    }

    let row = RegistryCustomer {
        id: normalized.clone(),
        name: request
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Customer")
            .to_string(),
        email: normalized.clone(),
        videos: Some(videos),
        vimeo_link: None,
        updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    };

    match registry.upsert_customer(&row).await {
        Ok(stored) => {
            tracing::info!(email = %stored.email, "customer registered");
        }
        Err(err) => {
            tracing::warn!(error = %err, "customer registry update failed, video upload kept");
        }
    }
}
