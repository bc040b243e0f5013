use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod assignments;
mod cache;
mod customers;
mod error;
mod handlers;
mod metadata;
mod middleware;
mod models;
mod supabase_client;
mod vimeo_client;

use assignments::{AssignmentStore, InMemoryAssignmentStore};
use cache::{CustomerCacheStore, VimeoSentinelCache};
use error::ApiError;
use supabase_client::SupabaseClient;
use vimeo_client::{FolderQuery, VimeoClient};

// AppState holds the remote clients plus the folder coordinates. Both
// clients are optional: features whose credentials are missing answer
// with a configuration error instead of keeping the process from
// starting.
pub struct AppState {
    pub vimeo: Option<VimeoClient>,
    pub registry: Option<SupabaseClient>,
    pub customer_cache: Option<Arc<dyn CustomerCacheStore>>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub folder_id: String,
    pub owner_id: String,
}

impl AppState {
    pub fn vimeo(&self) -> Result<&VimeoClient, ApiError> {
        self.vimeo.as_ref().ok_or_else(|| {
            ApiError::Configuration("Vimeo access token not configured".to_string())
        })
    }

    pub fn registry(&self) -> Result<&SupabaseClient, ApiError> {
        self.registry.as_ref().ok_or_else(|| {
            ApiError::Configuration("Supabase credentials not configured".to_string())
        })
    }

    pub fn folder_query(&self) -> FolderQuery {
        FolderQuery {
            folder_id: self.folder_id.clone(),
            owner_id: self.owner_id.clone(),
            search: None,
        }
    }
}

const DEFAULT_FOLDER_ID: &str = "26555277";
const DEFAULT_OWNER_ID: &str = "112996063";
const DEFAULT_CACHE_FOLDER_ID: &str = "26918583";

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let folder_id =
        std::env::var("VIMEO_FOLDER_ID").unwrap_or_else(|_| DEFAULT_FOLDER_ID.to_string());
    let owner_id =
        std::env::var("VIMEO_OWNER_ID").unwrap_or_else(|_| DEFAULT_OWNER_ID.to_string());
    let cache_folder_id = std::env::var("VIMEO_CACHE_FOLDER_ID")
        .unwrap_or_else(|_| DEFAULT_CACHE_FOLDER_ID.to_string());

    // Initialize the Vimeo client if an access token is provided
    let vimeo = match std::env::var("VIMEO_ACCESS_TOKEN").ok() {
        Some(token) if !token.trim().is_empty() => {
            tracing::info!("Initializing Vimeo client...");
            Some(VimeoClient::new(token))
        }
        _ => {
            tracing::warn!("VIMEO_ACCESS_TOKEN not found. Video features will be disabled.");
            None
        }
    };

    // Initialize the Supabase registry client if credentials are provided
    let registry = match (
        std::env::var("SUPABASE_URL").ok(),
        std::env::var("SUPABASE_SERVICE_KEY").ok(),
    ) {
        (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
            tracing::info!("Initializing Supabase customer registry...");
            Some(SupabaseClient::new(url, key))
        }
        _ => {
            tracing::warn!(
                "Supabase credentials not found. Customer registry features will be disabled."
            );
            tracing::info!("To enable the registry, set: SUPABASE_URL, SUPABASE_SERVICE_KEY");
            None
        }
    };

    // The customer cache lives in a dedicated folder on the video host
    // and only works when the Vimeo client does.
    let customer_cache: Option<Arc<dyn CustomerCacheStore>> = vimeo.as_ref().map(|client| {
        Arc::new(VimeoSentinelCache::new(
            client.clone(),
            cache_folder_id.clone(),
            owner_id.clone(),
        )) as Arc<dyn CustomerCacheStore>
    });

    // In-memory assignment store; swap for a persistent backend by
    // injecting a different AssignmentStore here.
    let assignments: Arc<dyn AssignmentStore> = Arc::new(InMemoryAssignmentStore::default());

    let shared_state = Arc::new(AppState {
        vimeo,
        registry,
        customer_cache,
        assignments,
        folder_id,
        owner_id,
    });

    // Build our application with all routes and shared state
    let app = Router::new()
        .merge(handlers::customers::customer_routes())
        .merge(handlers::videos::video_routes())
        .merge(handlers::upload::upload_routes())
        .merge(handlers::registry::registry_routes())
        .merge(handlers::migrate::migrate_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state.clone()));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,recording_sync=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,recording_sync=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("recording_sync starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let vimeo_configured = std::env::var("VIMEO_ACCESS_TOKEN").is_ok();
    let supabase_configured =
        std::env::var("SUPABASE_URL").is_ok() && std::env::var("SUPABASE_SERVICE_KEY").is_ok();
    tracing::info!(
        "Configuration - Vimeo: {}, Supabase: {}",
        if vimeo_configured { "configured" } else { "missing" },
        if supabase_configured { "configured" } else { "missing" },
    );

    Ok(())
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let vimeo_status = if state.vimeo.is_some() { "configured" } else { "not_configured" };
    let registry_status = if state.registry.is_some() { "configured" } else { "not_configured" };
    let cache_status = if state.customer_cache.is_some() { "configured" } else { "not_configured" };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "vimeo": vimeo_status,
            "customer_registry": registry_status,
            "customer_cache": cache_status,
        },
        "folderId": state.folder_id,
    }))
}
