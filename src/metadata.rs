// Description metadata codec. The video host has no custom-field
// support, so recordings carry a small labeled block at the top of the
// description and the service regex-extracts it back out.

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;

// Whitespace around the colon is confined to the label's own line so an
// empty value can never capture the following label line.
lazy_static::lazy_static! {
    static ref CUSTOMER_RE: Regex = Regex::new(r"(?im)^Customer[ \t]*:[ \t]*(.+)$").unwrap();
    static ref CUSTOMER_EMAIL_RE: Regex = Regex::new(r"(?im)^Customer Email[ \t]*:[ \t]*(.+)$").unwrap();
    static ref RECORDED_BY_RE: Regex = Regex::new(r"(?im)^Recorded By[ \t]*:[ \t]*(.+)$").unwrap();
    static ref RECORDED_BY_EMAIL_RE: Regex = Regex::new(r"(?im)^Recorded By Email[ \t]*:[ \t]*(.+)$").unwrap();
    static ref RECORDING_DATE_RE: Regex = Regex::new(r"(?im)^Recording Date[ \t]*:[ \t]*(.+)$").unwrap();

    // Legacy shim: descriptions written before the labeled convention
    // used a bare `email:` line or just dropped an address into the text.
    // Tried only when the `Customer Email:` label is absent.
    static ref LEGACY_EMAIL_LABEL_RE: Regex = Regex::new(r"(?im)^email[ \t]*:[ \t]*(.+)$").unwrap();
    static ref BARE_EMAIL_RE: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();

    static ref ANY_LABEL_RE: Regex = Regex::new(
        r"(?i)^(Customer|Customer Email|Recorded By|Recorded By Email|Recording Date)\s*:"
    ).unwrap();
}

/// Fields recovered from a description. A label that is absent from the
/// text yields `None`, never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_by_email: Option<String>,
    pub recording_date: Option<String>,
}

/// Inputs for [`build_metadata`]. Missing fields render as empty values
/// after their label; the schema is positional, not omitted.
#[derive(Debug, Clone, Default)]
pub struct MetadataFields {
    pub description: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_by_email: Option<String>,
}

/// Encode the labeled block. `Recording Date` is stamped at call time.
pub fn build_metadata(fields: &MetadataFields) -> String {
    let blank = String::new();
    [
        format!("Customer: {}", fields.customer_name.as_ref().unwrap_or(&blank)),
        format!("Customer Email: {}", fields.customer_email.as_ref().unwrap_or(&blank)),
        format!("Recorded By: {}", fields.recorded_by.as_ref().unwrap_or(&blank)),
        format!("Recorded By Email: {}", fields.recorded_by_email.as_ref().unwrap_or(&blank)),
        format!(
            "Recording Date: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        String::new(),
        fields.description.clone().unwrap_or_default(),
    ]
    .join("\n")
}

/// Decode a description into its labeled fields. First match wins per
/// label; matches are trimmed. Never fails: malformed or empty input
/// yields an empty mapping.
pub fn extract_video_metadata(description: &str) -> VideoMetadata {
    if description.is_empty() {
        return VideoMetadata::default();
    }

    let first = |re: &Regex| {
        re.captures(description)
            .map(|caps| caps[1].trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let customer_email = first(&CUSTOMER_EMAIL_RE)
        .or_else(|| first(&LEGACY_EMAIL_LABEL_RE))
        .or_else(|| {
            BARE_EMAIL_RE
                .find(description)
                .map(|m| m.as_str().to_string())
        });

    VideoMetadata {
        customer: first(&CUSTOMER_RE),
        customer_email,
        recorded_by: first(&RECORDED_BY_RE),
        recorded_by_email: first(&RECORDED_BY_EMAIL_RE),
        recording_date: first(&RECORDING_DATE_RE),
    }
}

/// The free-text remainder of a description once the labeled block is
/// removed. Used when handing descriptions back to the UI.
pub fn strip_metadata_block(description: &str) -> String {
    description
        .lines()
        .filter(|line| !ANY_LABEL_RE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_full_labeled_block() {
        let description = "Customer: Alice Smith\n\
                           Customer Email: alice@example.com\n\
                           Recorded By: Bob\n\
                           Recorded By Email: bob@corp.com\n\
                           Recording Date: 2026-01-15T10:30:00.000Z\n\
                           \n\
                           Quarterly walkthrough.";
        let meta = extract_video_metadata(description);
        assert_eq!(meta.customer.as_deref(), Some("Alice Smith"));
        assert_eq!(meta.customer_email.as_deref(), Some("alice@example.com"));
        assert_eq!(meta.recorded_by.as_deref(), Some("Bob"));
        assert_eq!(meta.recorded_by_email.as_deref(), Some("bob@corp.com"));
        assert_eq!(meta.recording_date.as_deref(), Some("2026-01-15T10:30:00.000Z"));
    }

    #[test]
    fn absent_labels_yield_absent_fields() {
        let meta = extract_video_metadata("Just a plain description.");
        assert_eq!(meta, VideoMetadata::default());
        assert_eq!(extract_video_metadata(""), VideoMetadata::default());
    }

    #[test]
    fn first_match_wins_per_label() {
        let meta = extract_video_metadata("Customer: First\nCustomer: Second");
        assert_eq!(meta.customer.as_deref(), Some("First"));
    }

    #[test]
    fn labels_are_case_insensitive_and_tolerate_spacing() {
        let meta = extract_video_metadata("customer email :  ALICE@EXAMPLE.COM  ");
        assert_eq!(meta.customer_email.as_deref(), Some("ALICE@EXAMPLE.COM"));
    }

    #[test]
    fn customer_label_does_not_swallow_the_email_line() {
        let meta = extract_video_metadata("Customer Email: a@x.com");
        assert_eq!(meta.customer, None);
        assert_eq!(meta.customer_email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn legacy_email_label_applies_only_without_the_primary() {
        let meta = extract_video_metadata("email: old@legacy.com");
        assert_eq!(meta.customer_email.as_deref(), Some("old@legacy.com"));

        let meta = extract_video_metadata("Customer Email: new@current.com\nemail: old@legacy.com");
        assert_eq!(meta.customer_email.as_deref(), Some("new@current.com"));
    }

    #[test]
    fn bare_email_token_is_the_last_resort() {
        let meta = extract_video_metadata("Recording for carol@client.org, please review.");
        assert_eq!(meta.customer_email.as_deref(), Some("carol@client.org"));
    }

    #[test]
    fn encode_then_decode_recovers_fields() {
        let fields = MetadataFields {
            description: Some("Kickoff call".to_string()),
            customer_name: Some("Alice Smith".to_string()),
            customer_email: Some("alice@example.com".to_string()),
            recorded_by: Some("Bob".to_string()),
            recorded_by_email: Some("bob@corp.com".to_string()),
        };
        let encoded = build_metadata(&fields);
        let meta = extract_video_metadata(&encoded);
        assert_eq!(meta.customer.as_deref(), Some("Alice Smith"));
        assert_eq!(meta.customer_email.as_deref(), Some("alice@example.com"));
        assert_eq!(meta.recorded_by.as_deref(), Some("Bob"));
        assert_eq!(meta.recorded_by_email.as_deref(), Some("bob@corp.com"));
        // Regenerated at encode time, so only its shape is stable.
        assert!(meta.recording_date.unwrap().ends_with('Z'));
    }

    #[test]
    fn missing_fields_render_as_empty_labels_and_decode_as_absent() {
        let encoded = build_metadata(&MetadataFields::default());
        assert!(encoded.starts_with("Customer: \n"));
        let meta = extract_video_metadata(&encoded);
        assert_eq!(meta.customer, None);
        assert_eq!(meta.customer_email, None);
    }

    #[test]
    fn strip_removes_the_labeled_block() {
        let fields = MetadataFields {
            description: Some("Follow-up demo.".to_string()),
            customer_name: Some("Alice".to_string()),
            customer_email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        assert_eq!(strip_metadata_block(&build_metadata(&fields)), "Follow-up demo.");
    }
}
