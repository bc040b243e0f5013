// Customer registry CRUD. The registry is the persistent, fast lookup
// counterpart to the live video scan: one row per customer, keyed by
// lowercased email.

use crate::error::ApiError;
use crate::models::customer::RegistryCustomer;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn registry_routes() -> Router {
    Router::new().route(
        "/api/customer-registry",
        get(list_registry).post(upsert_registry).delete(delete_registry),
    )
}

async fn list_registry(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let registry = state.registry()?;
    let customers = registry.list_customers().await?;
    tracing::info!(count = customers.len(), "registry listed");
    Ok(Json(json!(customers)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryUpsertRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub video_uri: Option<String>,
}

/// Add or update one customer. An existing row's video list is
/// preserved and extended rather than replaced.
async fn upsert_registry(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<RegistryUpsertRequest>,
) -> Result<Json<Value>, ApiError> {
    let registry = state.registry()?;

    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;
    let normalized = email.to_lowercase();

    let mut videos = match registry.find_customer_by_email(&normalized).await {
        Ok(Some(existing)) => existing.videos.unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "registry lookup failed before upsert");
            Vec::new()
        }
    };
    if let Some(video_uri) = body
        .video_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
    {
        if !videos.iter().any(|uri| uri == video_uri) {
            videos.push(video_uri.to_string());
        }
    }

    let row = RegistryCustomer {
        id: normalized.clone(),
        name: body
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Customer")
            .to_string(),
        email: normalized,
        videos: Some(videos),
        vimeo_link: None,
        updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    };

    let stored = registry.upsert_customer(&row).await?;
    tracing::info!(email = %stored.email, videos = stored.videos.as_ref().map_or(0, |v| v.len()), "registry updated");
    Ok(Json(json!({ "success": true, "customer": stored })))
}

#[derive(Debug, Deserialize)]
pub struct RegistryDeleteRequest {
    pub email: Option<String>,
}

async fn delete_registry(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<RegistryDeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    let registry = state.registry()?;

    let email = body
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".to_string()))?;

    registry.delete_customer(email).await?;
    tracing::info!(email = %email, "registry row deleted");
    Ok(Json(json!({ "success": true })))
}
