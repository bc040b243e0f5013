// Customer-facing wire types: the summarized directory entry served to
// the UI (camelCase) and the registry row stored in the customers table
// (column names).

use serde::{Deserialize, Serialize};

/// One deduplicated customer derived from a set of videos. Exactly one
/// summary exists per distinct normalized email; the whole list is
/// recomputed on every aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub video_count: u32,
    pub last_recording_date: Option<String>,
}

/// A row of the `customers` table. `id` doubles as the conflict key and
/// is always the lowercased email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vimeo_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Minimal upsert payload used by the bulk migration (only columns that
/// are guaranteed to exist in the table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryUpsertRow {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl RegistryUpsertRow {
    /// Registry form of a summary: id and email are the lowercased,
    /// trimmed address. Returns None when the summary carries nothing
    /// that looks like an email; those entries are reported separately
    /// by the migration instead of being submitted.
    pub fn from_summary(summary: &CustomerSummary) -> Option<Self> {
        let email = summary.email.trim().to_lowercase();
        if !looks_like_email(&email) {
            return None;
        }
        let name = if summary.name.trim().is_empty() {
            "Unknown Customer".to_string()
        } else {
            summary.name.clone()
        };
        Some(Self {
            id: email.clone(),
            name,
            email,
        })
    }
}

pub fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(email: &str, name: &str) -> CustomerSummary {
        CustomerSummary {
            id: email.to_lowercase().chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
            name: name.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            video_count: 1,
            last_recording_date: None,
        }
    }

    #[test]
    fn registry_row_lowercases_email() {
        let row = RegistryUpsertRow::from_summary(&summary("Alice@Example.COM", "Alice")).unwrap();
        assert_eq!(row.id, "alice@example.com");
        assert_eq!(row.email, "alice@example.com");
        assert_eq!(row.name, "Alice");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(RegistryUpsertRow::from_summary(&summary("not-an-email", "X")).is_none());
        assert!(RegistryUpsertRow::from_summary(&summary("@nope.com", "X")).is_none());
        assert!(RegistryUpsertRow::from_summary(&summary("a@no-dot", "X")).is_none());
        assert!(RegistryUpsertRow::from_summary(&summary("", "X")).is_none());
    }

    #[test]
    fn blank_name_falls_back_to_unknown() {
        let row = RegistryUpsertRow::from_summary(&summary("a@x.com", "  ")).unwrap();
        assert_eq!(row.name, "Unknown Customer");
    }

    #[test]
    fn summary_serializes_camel_case() {
        let json = serde_json::to_value(summary("a@x.com", "Alice")).unwrap();
        assert!(json.get("videoCount").is_some());
        assert!(json.get("lastRecordingDate").is_some());
        assert!(json.get("firstName").is_some());
    }
}
