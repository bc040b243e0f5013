// Video-to-user assignment store. Assignments let a recording appear in
// a user's personal view without moving it out of the main folder. The
// store is injected through AppState so a persistent backend can replace
// the in-memory one; the shipped backend is process-lifetime only and
// lost on restart, an explicit stop-gap.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAssignment {
    pub video_id: String,
    pub video_uri: String,
    pub video_title: Option<String>,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub assigned_date: String,
}

impl VideoAssignment {
    pub fn new(
        video_uri: String,
        video_title: Option<String>,
        user_id: String,
        user_name: Option<String>,
        user_email: Option<String>,
    ) -> Self {
        let video_id = video_uri
            .rsplit('/')
            .next()
            .unwrap_or(video_uri.as_str())
            .to_string();
        Self {
            video_id,
            video_uri,
            video_title,
            user_id,
            user_name,
            user_email,
            assigned_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, video_id: &str) -> Option<VideoAssignment>;
    async fn set(&self, assignment: VideoAssignment);
    async fn list_for_user(&self, user_id: &str) -> Vec<VideoAssignment>;
}

/// Keyed by video id; re-assigning a video replaces its previous owner.
#[derive(Default)]
pub struct InMemoryAssignmentStore {
    inner: RwLock<HashMap<String, VideoAssignment>>,
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn get(&self, video_id: &str) -> Option<VideoAssignment> {
        self.inner.read().await.get(video_id).cloned()
    }

    async fn set(&self, assignment: VideoAssignment) {
        self.inner
            .write()
            .await
            .insert(assignment.video_id.clone(), assignment);
    }

    async fn list_for_user(&self, user_id: &str) -> Vec<VideoAssignment> {
        let mut assignments: Vec<VideoAssignment> = self
            .inner
            .read()
            .await
            .values()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.assigned_date.cmp(&b.assigned_date));
        assignments
    }
}
