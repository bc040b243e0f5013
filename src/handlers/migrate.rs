// Bulk migration: scan the recording folder, summarize its customers,
// and upsert them into the registry. Repeatable: the upsert is
// conflict-on-id idempotent, so re-running converges to the same rows.

use crate::customers::summarize_customers_from_videos;
use crate::error::ApiError;
use crate::models::customer::RegistryUpsertRow;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub fn migrate_routes() -> Router {
    Router::new().route("/api/migrate-vimeo-customers", post(migrate_customers))
}

async fn migrate_customers(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let vimeo = state.vimeo()?;
    let registry = state.registry()?;

    tracing::info!("starting customer migration from folder videos");
    let videos = vimeo.fetch_folder_videos(&state.folder_query()).await?;
    let summaries = summarize_customers_from_videos(&videos);
    tracing::info!(
        videos = videos.len(),
        customers = summaries.len(),
        "extracted customers for migration"
    );

    if summaries.is_empty() {
        return Ok(Json(json!({
            "success": true,
            "total": 0,
            "migrated": 0,
            "alreadyExisting": 0,
            "invalid": [],
        })));
    }

    // Summaries without a usable email are reported, never submitted.
    let mut rows: Vec<RegistryUpsertRow> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();
    for summary in &summaries {
        match RegistryUpsertRow::from_summary(summary) {
            Some(row) => rows.push(row),
            None => invalid.push(summary.email.clone()),
        }
    }

    // Pre-check is reporting only: the upsert itself is idempotent and
    // submits every valid row regardless.
    let existing_emails: HashSet<String> = registry
        .list_customers()
        .await?
        .into_iter()
        .map(|customer| customer.email.to_lowercase())
        .collect();
    let already_existing = rows
        .iter()
        .filter(|row| existing_emails.contains(&row.email))
        .count();
    let newly_added = rows.len() - already_existing;
    tracing::info!(
        new = newly_added,
        existing = already_existing,
        invalid = invalid.len(),
        "migration stats"
    );

    let migrated = registry.upsert_customers(&rows).await?;
    tracing::info!(migrated, "customer migration completed");

    Ok(Json(json!({
        "success": true,
        "total": summaries.len(),
        "migrated": newly_added,
        "alreadyExisting": already_existing,
        "upserted": migrated,
        "invalid": invalid,
    })))
}
