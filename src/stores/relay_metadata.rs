/// NIP-65: Relay List Metadata (kind 10002)
///
/// Turns a profile's relay list into the read/write map shown on the profile
/// relays tab.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Read/write permissions for a single relay
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    pub read: bool,
    pub write: bool,
}

/// Relay configuration keyed by relay URL
pub type RelayMap = BTreeMap<String, RelayConfig>;

/// Parse relay list from kind 10002 tags
/// NIP-65 tag format:
/// - ["r", "wss://relay.url"] = both read and write
/// - ["r", "wss://relay.url", "read"] = read only
/// - ["r", "wss://relay.url", "write"] = write only
///
/// Tags with a URL that is not ws/wss are skipped. A relay listed twice keeps
/// the union of its markers.
pub fn extract_relay_config_from_tags(tags: &[Vec<String>]) -> RelayMap {
    let mut relays = RelayMap::new();

    for tag in tags {
        if tag.first().map(|k| k.as_str()) != Some("r") {
            continue;
        }

        let Some(raw_url) = tag.get(1) else {
            continue;
        };

        let Some(url) = normalize_relay_url(raw_url) else {
            log::debug!("Skipping invalid relay url: {}", raw_url);
            continue;
        };

        let config = match tag.get(2).map(|m| m.as_str()) {
            Some("read") => RelayConfig { read: true, write: false },
            Some("write") => RelayConfig { read: false, write: true },
            _ => RelayConfig { read: true, write: true },
        };

        let entry = relays.entry(url).or_default();
        entry.read |= config.read;
        entry.write |= config.write;
    }

    log::debug!("Parsed {} relays from relay list", relays.len());
    relays
}

/// Validate a relay URL and strip the trailing slash
fn normalize_relay_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "wss" && url.scheme() != "ws" {
        return None;
    }
    url.host_str()?;
    Some(url.as_str().trim_end_matches('/').to_string())
}
