/// Utilities for extracting metadata from NIP-23 article events
use crate::stores::profile::types::RawEvent;

/// Extract the article title from tags, with fallback
pub fn get_title(event: &RawEvent) -> String {
    event
        .first_tag("title")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Untitled Article".to_string())
}

/// Extract the article summary/description from tags
pub fn get_summary(event: &RawEvent) -> Option<String> {
    event.first_tag("summary").map(|s| s.to_string())
}

/// Extract the article cover image URL from tags
pub fn get_image(event: &RawEvent) -> Option<String> {
    event.first_tag("image").map(|s| s.to_string())
}

/// Extract the published_at timestamp from tags
/// Falls back to event created_at if not present
pub fn get_published_at(event: &RawEvent) -> u64 {
    event
        .first_tag("published_at")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(event.created_at)
}

/// Extract the article identifier (d tag)
pub fn get_identifier(event: &RawEvent) -> Option<String> {
    event.first_tag("d").map(|s| s.to_string())
}
