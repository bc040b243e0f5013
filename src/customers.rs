// Customer summarizer: turns a flat list of folder videos into the
// deduplicated customer directory served by /api/customers. Pure and
// deterministic; the whole list is recomputed on every run.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::metadata::extract_video_metadata;
use crate::models::customer::CustomerSummary;
use crate::models::vimeo::VideoRecord;

pub fn summarize_customers_from_videos(videos: &[VideoRecord]) -> Vec<CustomerSummary> {
    let mut by_email: HashMap<String, CustomerSummary> = HashMap::new();

    for video in videos {
        let metadata = extract_video_metadata(video.description.as_deref().unwrap_or(""));
        let Some(email) = metadata.customer_email.as_deref().map(str::trim) else {
            continue;
        };
        if email.is_empty() {
            continue;
        }

        let normalized = email.to_lowercase();
        let created = video.created_time.as_deref().and_then(normalize_timestamp);

        let summary = by_email.entry(normalized.clone()).or_insert_with(|| {
            let display_name = metadata
                .customer
                .clone()
                .filter(|name| !name.trim().is_empty())
                .or_else(|| video.name.clone().filter(|name| !name.trim().is_empty()))
                .unwrap_or_else(|| "Unknown Customer".to_string());
            let (first_name, last_name) = split_display_name(&display_name);
            CustomerSummary {
                id: sanitize_email_id(&normalized),
                name: display_name,
                email: normalized.clone(),
                first_name,
                last_name,
                video_count: 0,
                last_recording_date: None,
            }
        });

        summary.video_count += 1;
        if let Some(created) = created {
            // Normalized RFC-3339 strings compare lexicographically.
            if summary
                .last_recording_date
                .as_deref()
                .map_or(true, |current| created.as_str() > current)
            {
                summary.last_recording_date = Some(created);
            }
        }
    }

    let mut customers: Vec<CustomerSummary> = by_email.into_values().collect();
    customers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    customers
}

/// Lowercased email with everything non-alphanumeric stripped.
fn sanitize_email_id(normalized_email: &str) -> String {
    normalized_email
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn split_display_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Re-serialize a creation timestamp to UTC RFC-3339 with millisecond
/// precision so that string comparison orders correctly.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(name: &str, description: &str, created_time: &str) -> VideoRecord {
        VideoRecord {
            uri: format!("/videos/{}", name.len()),
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            link: None,
            created_time: if created_time.is_empty() {
                None
            } else {
                Some(created_time.to_string())
            },
            pictures: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(summarize_customers_from_videos(&[]).is_empty());
    }

    #[test]
    fn videos_without_customer_email_are_skipped() {
        let videos = vec![video("No metadata", "Plain description", "2026-01-01T00:00:00+00:00")];
        assert!(summarize_customers_from_videos(&videos).is_empty());
    }

    #[test]
    fn case_differing_emails_collapse_into_one_customer() {
        let videos = vec![
            video("Alice", "Customer Email: A@x.com", "2026-01-01T00:00:00+00:00"),
            video("Alice", "Customer Email: a@x.com", "2026-01-02T00:00:00+00:00"),
        ];
        let customers = summarize_customers_from_videos(&videos);
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].email, "a@x.com");
        assert_eq!(customers[0].video_count, 2);
    }

    #[test]
    fn summarizes_and_sorts_the_directory() {
        let videos = vec![
            video("Bob", "Customer Email: b@y.com", "2026-03-01T00:00:00+00:00"),
            video("Alice", "Customer Email: a@x.com", "2026-01-10T08:00:00+00:00"),
            video("Alice V2", "Customer Email: a@x.com", "2026-02-20T09:30:00+00:00"),
        ];
        let customers = summarize_customers_from_videos(&videos);
        assert_eq!(customers.len(), 2);

        assert_eq!(customers[0].name, "Alice");
        assert_eq!(customers[0].email, "a@x.com");
        assert_eq!(customers[0].video_count, 2);
        assert_eq!(
            customers[0].last_recording_date.as_deref(),
            Some("2026-02-20T09:30:00.000Z")
        );

        assert_eq!(customers[1].name, "Bob");
        assert_eq!(customers[1].email, "b@y.com");
        assert_eq!(customers[1].video_count, 1);
    }

    #[test]
    fn summarizer_is_idempotent() {
        let videos = vec![
            video("Bob", "Customer Email: b@y.com", "2026-03-01T00:00:00+00:00"),
            video("Alice", "Customer: Alice Smith\nCustomer Email: a@x.com", ""),
        ];
        let first = summarize_customers_from_videos(&videos);
        let second = summarize_customers_from_videos(&videos);
        assert_eq!(first, second);
    }

    #[test]
    fn name_seeding_prefers_metadata_then_title() {
        let videos = vec![
            video("Title Name", "Customer: Meta Name\nCustomer Email: a@x.com", ""),
            video("Title Only", "Customer Email: b@y.com", ""),
        ];
        let customers = summarize_customers_from_videos(&videos);
        let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Meta Name"));
        assert!(names.contains(&"Title Only"));
    }

    #[test]
    fn unknown_customer_fallback_and_name_split() {
        let mut nameless = video("", "Customer Email: c@z.com", "");
        nameless.name = None;
        let customers = summarize_customers_from_videos(&[nameless]);
        assert_eq!(customers[0].name, "Unknown Customer");
        assert_eq!(customers[0].first_name, "Unknown");
        assert_eq!(customers[0].last_name, "Customer");
        assert_eq!(customers[0].id, "czcom");
    }

    #[test]
    fn timestamps_are_normalized_to_utc_millis() {
        assert_eq!(
            normalize_timestamp("2026-01-15T10:30:00-05:00").as_deref(),
            Some("2026-01-15T15:30:00.000Z")
        );
        assert_eq!(normalize_timestamp("not a date"), None);
    }
}
