// Customer directory handlers: the cached summary listing and the
// picker search used by the recorder UI.

use crate::customers::summarize_customers_from_videos;
use crate::error::ApiError;
use crate::models::customer::CustomerSummary;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn customer_routes() -> Router {
    Router::new()
        .route("/api/customers", get(list_customers))
        .route("/api/search-customers", get(search_customers))
}

#[derive(Deserialize)]
pub struct CustomersQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Serve the summarized customer directory, from cache when fresh.
/// Without `page`/`limit` the response is the plain array; with either
/// present it is wrapped in a pagination envelope.
async fn list_customers(
    Query(params): Query<CustomersQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let customers = load_customers(&state).await?;

    if params.page.is_none() && params.limit.is_none() {
        return Ok(Json(json!(customers)));
    }

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(50).max(1);
    let total = customers.len();
    let total_pages = total.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit).min(total);
    let end = (start + limit).min(total);

    Ok(Json(json!({
        "customers": customers[start..end],
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages,
    })))
}

async fn load_customers(state: &AppState) -> Result<Vec<CustomerSummary>, ApiError> {
    if let Some(cache) = &state.customer_cache {
        if let Some(customers) = cache.get(&state.folder_id).await {
            tracing::info!(count = customers.len(), "serving customers from cache");
            return Ok(customers);
        }
    }

    let vimeo = state.vimeo()?;
    let videos = vimeo.fetch_folder_videos(&state.folder_query()).await?;
    tracing::info!(count = videos.len(), "summarizing customers from folder videos");
    let customers = summarize_customers_from_videos(&videos);

    if let Some(cache) = &state.customer_cache {
        cache.set(&state.folder_id, &customers).await;
    }

    Ok(customers)
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomerMatch {
    id: String,
    name: String,
    email: String,
    exact_email_match: bool,
}

const SEARCH_RESULT_LIMIT: usize = 20;

/// Substring search over the summarized directory; an empty query is an
/// empty result, not an error.
async fn search_customers(
    Query(params): Query<SearchQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(Json(json!([])));
    };
    let needle = query.to_lowercase();

    let customers = load_customers(&state).await?;
    let matches: Vec<CustomerMatch> = customers
        .iter()
        .filter(|customer| {
            customer.name.to_lowercase().contains(&needle) || customer.email.contains(&needle)
        })
        .take(SEARCH_RESULT_LIMIT)
        .map(|customer| CustomerMatch {
            id: customer.id.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            exact_email_match: customer.email == needle,
        })
        .collect();

    tracing::info!(query = %query, count = matches.len(), "customer search completed");
    Ok(Json(json!(matches)))
}
