// Customer cache. The summarized directory is expensive to recompute
// (full folder pagination), so the last result is stored behind a
// key-value style trait with a 24-hour freshness window. The shipped
// backend keeps the JSON blob inside a sentinel video's description in
// a dedicated cache folder. Every failure degrades to a miss; no call
// on this path ever errors out a request.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::customer::CustomerSummary;
use crate::vimeo_client::{FolderQuery, VimeoClient};

pub const CACHE_SENTINEL_NAME: &str = "CUSTOMERS_CACHE";
const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

lazy_static::lazy_static! {
    static ref CACHE_DATA_RE: Regex = Regex::new(r"(?s)CACHE_DATA:\s*(\{.*\})").unwrap();
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCacheEntry {
    pub customers: Vec<CustomerSummary>,
    /// Write time, epoch milliseconds.
    pub timestamp: i64,
    pub folder_id: String,
}

/// Best-effort cache of the summarized customer list. `get` returns
/// None on any failure or staleness; `set` is fire-and-forget. No
/// locking: concurrent writers race and the last write wins, acceptable
/// under the 24h staleness tolerance.
#[async_trait]
pub trait CustomerCacheStore: Send + Sync {
    async fn get(&self, folder_id: &str) -> Option<Vec<CustomerSummary>>;
    async fn set(&self, folder_id: &str, customers: &[CustomerSummary]);
}

/// Extract and validate a cache blob from a sentinel description.
fn parse_cache_entry(description: &str, now_ms: i64) -> Option<Vec<CustomerSummary>> {
    let blob = CACHE_DATA_RE.captures(description)?.get(1)?.as_str();
    let entry: CustomerCacheEntry = serde_json::from_str(blob).ok()?;
    if now_ms - entry.timestamp >= CACHE_TTL_MS {
        return None;
    }
    Some(entry.customers)
}

/// Cache backend that stores the blob inside the description of a
/// well-known sentinel video in a dedicated cache folder.
pub struct VimeoSentinelCache {
    vimeo: VimeoClient,
    cache_folder_id: String,
    owner_id: String,
}

impl VimeoSentinelCache {
    pub fn new(vimeo: VimeoClient, cache_folder_id: String, owner_id: String) -> Self {
        Self {
            vimeo,
            cache_folder_id,
            owner_id,
        }
    }

    async fn find_sentinel(&self) -> Result<Option<crate::models::vimeo::VideoRecord>, crate::error::ApiError> {
        let query = FolderQuery {
            folder_id: self.cache_folder_id.clone(),
            owner_id: self.owner_id.clone(),
            search: Some(CACHE_SENTINEL_NAME.to_string()),
        };
        let videos = self.vimeo.fetch_folder_videos(&query).await?;
        Ok(videos
            .into_iter()
            .find(|video| video.name.as_deref() == Some(CACHE_SENTINEL_NAME)))
    }
}

#[async_trait]
impl CustomerCacheStore for VimeoSentinelCache {
    async fn get(&self, _folder_id: &str) -> Option<Vec<CustomerSummary>> {
        let sentinel = match self.find_sentinel().await {
            Ok(Some(video)) => video,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load customers cache");
                return None;
            }
        };
        parse_cache_entry(
            sentinel.description.as_deref().unwrap_or(""),
            Utc::now().timestamp_millis(),
        )
    }

    async fn set(&self, folder_id: &str, customers: &[CustomerSummary]) {
        let sentinel = match self.find_sentinel().await {
            Ok(Some(video)) => video,
            Ok(None) => {
                // The cache never creates its own sentinel; population
                // requires one to exist in the cache folder already.
                tracing::warn!("no cache sentinel video found, skipping cache save");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save customers cache");
                return;
            }
        };

        let entry = CustomerCacheEntry {
            customers: customers.to_vec(),
            timestamp: Utc::now().timestamp_millis(),
            folder_id: folder_id.to_string(),
        };
        let blob = match serde_json::to_string(&entry) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize customers cache");
                return;
            }
        };
        let description = format!(
            "CACHE_DATA: {}\n\nThis video contains cached customer data. Do not delete.",
            blob
        );

        if let Err(err) = self
            .vimeo
            .patch_video(sentinel.video_id(), None, Some(&description))
            .await
        {
            tracing::warn!(error = %err, "failed to save customers cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn entry_description(age_ms: i64, now_ms: i64) -> String {
        let entry = CustomerCacheEntry {
            customers: vec![CustomerSummary {
                id: "axcom".to_string(),
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                first_name: "Alice".to_string(),
                last_name: String::new(),
                video_count: 3,
                last_recording_date: None,
            }],
            timestamp: now_ms - age_ms,
            folder_id: "26555277".to_string(),
        };
        format!(
            "CACHE_DATA: {}\n\nThis video contains cached customer data. Do not delete.",
            serde_json::to_string(&entry).unwrap()
        )
    }

    #[test]
    fn entry_younger_than_a_day_is_a_hit() {
        let now = 1_700_000_000_000;
        let customers = parse_cache_entry(&entry_description(23 * HOUR_MS, now), now).unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].email, "a@x.com");
    }

    #[test]
    fn entry_older_than_a_day_is_a_miss() {
        let now = 1_700_000_000_000;
        assert!(parse_cache_entry(&entry_description(25 * HOUR_MS, now), now).is_none());
        assert!(parse_cache_entry(&entry_description(24 * HOUR_MS, now), now).is_none());
    }

    #[test]
    fn missing_marker_is_a_miss() {
        assert!(parse_cache_entry("just a description", 0).is_none());
        assert!(parse_cache_entry("", 0).is_none());
    }

    #[test]
    fn malformed_blob_is_a_miss() {
        assert!(parse_cache_entry("CACHE_DATA: {not json}", 0).is_none());
    }

    #[test]
    fn marker_regex_spans_newlines_inside_the_blob() {
        let now = 1_700_000_000_000;
        let description = entry_description(HOUR_MS, now).replace("\"customers\":", "\"customers\":\n");
        assert!(parse_cache_entry(&description, now).is_some());
    }
}
