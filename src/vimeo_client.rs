// Vimeo REST client: folder discovery + pagination on the read side,
// upload/patch/move on the write side. All calls are Bearer-token
// authenticated with the versioned Accept header.

use reqwest::Client;
use serde_json::json;

use crate::error::ApiError;
use crate::models::vimeo::{CreateVideoResponse, VideoPage, VideoRecord};

pub const API_ROOT: &str = "https://api.vimeo.com";
const VIMEO_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const PAGE_SIZE: usize = 100;
/// Safety cap against circularly-linked pagination responses.
const MAX_PAGES_PER_CANDIDATE: usize = 25;

#[derive(Debug, Clone)]
pub struct VimeoClient {
    client: Client,
    access_token: String,
}

/// Where to look for a folder's videos. The folder/owner pair feeds the
/// candidate path list; `search` becomes the listing `query` parameter.
#[derive(Debug, Clone, Default)]
pub struct FolderQuery {
    pub folder_id: String,
    pub owner_id: String,
    pub search: Option<String>,
}

/// The remote API exposes folder-scoped video collections differently
/// depending on account and permission configuration. These are the
/// observed variants, in preference order.
fn candidate_paths(folder_id: &str, owner_id: &str) -> Vec<String> {
    vec![
        format!("/users/{}/projects/{}/videos", owner_id, folder_id),
        format!("/me/projects/{}/videos", folder_id),
        format!("/me/folders/{}/videos", folder_id),
        format!("/folders/{}/videos", folder_id),
    ]
}

/// Resolve a `paging.next` value against the API root.
fn to_absolute_url(path_or_url: &str) -> Option<String> {
    if path_or_url.is_empty() {
        return None;
    }
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        Some(path_or_url.to_string())
    } else if path_or_url.starts_with('/') {
        Some(format!("{}{}", API_ROOT, path_or_url))
    } else {
        Some(format!("{}/{}", API_ROOT, path_or_url))
    }
}

fn truncate_body(body: &str, max: usize) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= max {
        trimmed.to_string()
    } else {
        let mut end = max;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    }
}

impl VimeoClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    fn require_token(&self) -> Result<(), ApiError> {
        if self.access_token.trim().is_empty() {
            return Err(ApiError::Configuration(
                "Vimeo access token is required".to_string(),
            ));
        }
        Ok(())
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Accept", VIMEO_ACCEPT)
    }

    async fn read_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::remote(status, truncate_body(&body, 400))
    }

    async fn get_page(&self, url: &str) -> Result<VideoPage, ApiError> {
        let response = self.authed(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn fetch_paginated(
        &self,
        path: &str,
        search: Option<&str>,
    ) -> Result<Vec<VideoRecord>, ApiError> {
        let mut url = format!(
            "{}{}?per_page={}&sort=date&direction=desc",
            API_ROOT, path, PAGE_SIZE
        );
        if let Some(term) = search {
            url.push_str("&query=");
            url.push_str(&urlencoding::encode(term));
        }

        let mut videos = Vec::new();
        let mut next = Some(url);
        let mut pages_fetched = 0;

        while let Some(current) = next {
            if pages_fetched >= MAX_PAGES_PER_CANDIDATE {
                tracing::warn!(path = %path, "pagination guard hit, returning partial listing");
                break;
            }
            pages_fetched += 1;

            let page = self.get_page(&current).await?;
            let page_len = page.data.len();
            videos.extend(page.data);

            // A short page is the end of the collection even when the
            // server still hands out a next link.
            if page_len < PAGE_SIZE {
                break;
            }
            next = page
                .paging
                .and_then(|paging| paging.next)
                .as_deref()
                .and_then(to_absolute_url);
        }

        Ok(videos)
    }

    /// Retrieve the complete video set of a logical folder, probing each
    /// candidate resource path in order. The first candidate that yields
    /// at least one record wins; a candidate that returns an empty list
    /// without erroring is kept as the fallback result; an erroring
    /// candidate's message is collected and the next one tried.
    pub async fn fetch_folder_videos(
        &self,
        query: &FolderQuery,
    ) -> Result<Vec<VideoRecord>, ApiError> {
        self.require_token()?;

        let mut errors: Vec<String> = Vec::new();
        let mut empty_result: Option<Vec<VideoRecord>> = None;

        for path in candidate_paths(&query.folder_id, &query.owner_id) {
            match self.fetch_paginated(&path, query.search.as_deref()).await {
                Ok(videos) if !videos.is_empty() => {
                    tracing::debug!(path = %path, count = videos.len(), "folder listing resolved");
                    return Ok(videos);
                }
                Ok(videos) => {
                    if empty_result.is_none() {
                        empty_result = Some(videos);
                    }
                }
                Err(err) => {
                    tracing::debug!(path = %path, error = %err, "candidate path failed");
                    errors.push(format!("{}: {}", path, err));
                }
            }
        }

        if let Some(videos) = empty_result {
            return Ok(videos);
        }

        let message = if errors.is_empty() {
            format!("Unable to fetch videos for folder {}.", query.folder_id)
        } else {
            format!(
                "Unable to fetch videos for folder {}. Attempts: {}",
                query.folder_id,
                errors.join(" | ")
            )
        };
        Err(ApiError::Fetch(message))
    }

    async fn create_video(
        &self,
        approach: &str,
        title: &str,
        size: u64,
        description: &str,
    ) -> Result<(String, String), ApiError> {
        self.require_token()?;

        let body = json!({
            "upload": { "approach": approach, "size": size },
            "name": title,
            "description": description,
            "privacy": { "view": "unlisted" }
        });

        let response = self
            .authed(self.client.post(format!("{}/me/videos", API_ROOT)))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let err = Self::read_error(response).await;
            tracing::error!(error = %err, "video creation failed");
            return Err(err);
        }

        let created: CreateVideoResponse = response.json().await?;
        let upload_link = created.upload.and_then(|u| u.upload_link);
        match (upload_link, created.uri) {
            (Some(link), Some(uri)) => Ok((link, uri)),
            _ => Err(ApiError::Fetch(
                "Vimeo did not return an upload link".to_string(),
            )),
        }
    }

    /// Request a resumable (tus) upload ticket.
    pub async fn create_tus_upload(
        &self,
        title: &str,
        size: u64,
        description: &str,
    ) -> Result<(String, String), ApiError> {
        self.create_video("tus", title, size, description).await
    }

    /// Request a single-shot POST upload ticket.
    pub async fn create_post_upload(
        &self,
        title: &str,
        size: u64,
        description: &str,
    ) -> Result<(String, String), ApiError> {
        self.create_video("post", title, size, description).await
    }

    /// Push the payload to an upload link obtained from a ticket.
    pub async fn upload_video_bytes(
        &self,
        upload_link: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(upload_link)
            .header("Content-Type", mime_type.to_string())
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            let err = Self::read_error(response).await;
            tracing::error!(error = %err, "video content upload failed");
            return Err(err);
        }
        Ok(())
    }

    /// Rewrite a video's display name and/or description.
    pub async fn patch_video(
        &self,
        video_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ApiError> {
        self.require_token()?;

        let mut body = json!({});
        if let Some(name) = name {
            body["name"] = json!(name);
            body["privacy"] = json!({ "view": "unlisted" });
        }
        if let Some(description) = description {
            body["description"] = json!(description);
        }

        let response = self
            .authed(
                self.client
                    .patch(format!("{}/videos/{}", API_ROOT, video_id)),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let err = Self::read_error(response).await;
            tracing::error!(video_id, error = %err, "video patch failed");
            return Err(err);
        }
        Ok(())
    }

    /// Place a video into a folder (owner-scoped project path).
    pub async fn move_to_folder(
        &self,
        owner_id: &str,
        folder_id: &str,
        video_id: &str,
    ) -> Result<(), ApiError> {
        self.require_token()?;

        let url = format!(
            "{}/users/{}/projects/{}/videos/{}",
            API_ROOT, owner_id, folder_id, video_id
        );
        let response = self
            .authed(self.client.put(url))
            .header("Content-Type", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let err = Self::read_error(response).await;
            tracing::error!(video_id, folder_id, error = %err, "folder move failed");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_paths_keep_preference_order() {
        let paths = candidate_paths("f1", "u9");
        assert_eq!(
            paths,
            vec![
                "/users/u9/projects/f1/videos",
                "/me/projects/f1/videos",
                "/me/folders/f1/videos",
                "/folders/f1/videos",
            ]
        );
    }

    #[test]
    fn next_links_resolve_against_the_api_root() {
        assert_eq!(
            to_absolute_url("/me/projects/1/videos?page=2").as_deref(),
            Some("https://api.vimeo.com/me/projects/1/videos?page=2")
        );
        assert_eq!(
            to_absolute_url("https://api.vimeo.com/x").as_deref(),
            Some("https://api.vimeo.com/x")
        );
        assert_eq!(to_absolute_url(""), None);
    }

    #[test]
    fn error_bodies_are_truncated() {
        let long = "x".repeat(1000);
        assert_eq!(truncate_body(&long, 400).len(), 400);
        assert_eq!(truncate_body("  short  ", 400), "short");
    }

    #[tokio::test]
    async fn empty_token_fails_before_any_network_call() {
        let client = VimeoClient::new(String::new());
        let query = FolderQuery {
            folder_id: "123".to_string(),
            owner_id: "456".to_string(),
            search: None,
        };
        match client.fetch_folder_videos(&query).await {
            Err(ApiError::Configuration(message)) => {
                assert!(message.contains("access token"));
            }
            other => panic!("expected configuration error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn blank_token_also_fails_fast() {
        let client = VimeoClient::new("   ".to_string());
        let result = client
            .create_tus_upload("title", 1024, "description")
            .await;
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }
}
