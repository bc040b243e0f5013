// Wire types for the video host REST API. Field names mirror the
// remote payloads (snake_case); unknown response fields are ignored.

use serde::{Deserialize, Serialize};

/// A single video as returned by the folder listing endpoints.
/// `uri` is the only field the API guarantees; everything else is
/// treated as optional and defaulted by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub uri: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub created_time: Option<String>,
    pub pictures: Option<Pictures>,
}

impl VideoRecord {
    /// Last path segment of the resource uri, e.g. "/videos/123" -> "123".
    pub fn video_id(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pictures {
    pub base_link: Option<String>,
}

/// One page of a folder listing.
#[derive(Debug, Deserialize)]
pub struct VideoPage {
    #[serde(default)]
    pub data: Vec<VideoRecord>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    pub next: Option<String>,
}

/// Response to a video-creation call (both tus and post approaches).
#[derive(Debug, Deserialize)]
pub struct CreateVideoResponse {
    pub uri: Option<String>,
    pub link: Option<String>,
    pub upload: Option<UploadInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UploadInfo {
    pub upload_link: Option<String>,
}

/// Upload ticket handed back to the browser for the resumable flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    pub success: bool,
    pub upload_link: String,
    pub video_uri: String,
    pub video_id: String,
    pub folder_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_is_last_uri_segment() {
        let video = VideoRecord {
            uri: "/videos/987654321".to_string(),
            name: None,
            description: None,
            link: None,
            created_time: None,
            pictures: None,
        };
        assert_eq!(video.video_id(), "987654321");
    }

    #[test]
    fn page_with_missing_data_deserializes_empty() {
        let page: VideoPage = serde_json::from_str(r#"{"paging": {"next": null}}"#).unwrap();
        assert!(page.data.is_empty());
        assert!(page.paging.unwrap().next.is_none());
    }
}
