//! Event kinds understood by the profile view
//!
//! Standard Nostr kinds plus the caching service's synthetic kinds. Raw events
//! are decoded once, at the boundary, into the closed `ProfileEvent` union.

use serde::Deserialize;

use super::errors::{ProfileError, ProfileResult};
use super::types::{
    FilterAction, FilterReason, FollowerCounts, NoteActions, NoteStats, PaginationInfo, RawEvent, UserProfile,
    UserStats,
};
use crate::stores::relay_metadata::{extract_relay_config_from_tags, RelayMap};
use crate::utils::format::truncate_pubkey;
use crate::utils::nip19;

// =============================================================================
// Kind Constants
// =============================================================================

pub const METADATA: u32 = 0;
pub const TEXT: u32 = 1;
pub const CONTACTS: u32 = 3;
pub const REPOST: u32 = 6;
pub const ZAP: u32 = 9735;
pub const HIGHLIGHT: u32 = 9802;
pub const USER_RELAYS: u32 = 10002;
pub const LONG_FORM: u32 = 30023;

pub const NOTE_STATS: u32 = 10_000_100;
pub const USER_STATS: u32 = 10_000_105;
pub const MENTIONS: u32 = 10_000_107;
pub const FEED_RANGE: u32 = 10_000_113;
pub const NOTE_ACTIONS: u32 = 10_000_115;
pub const IS_FOLLOWING: u32 = 10_000_125;
pub const FILTERING_REASON: u32 = 10_000_127;
pub const USER_FOLLOWER_COUNTS: u32 = 10_000_133;

// =============================================================================
// Decoded Events
// =============================================================================

/// An inbound event after kind dispatch and content parsing
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileEvent {
    Metadata(UserProfile),
    UserStats(UserStats),
    /// `None` means the filter let the profile through
    FilteringReason(Option<FilterReason>),
    Contacts { created_at: u64, follows: Vec<String> },
    FollowerCounts(FollowerCounts),
    UserRelays(RelayMap),
    IsFollowing(bool),
    /// Text note or repost
    Note(RawEvent),
    Article(RawEvent),
    Highlight(RawEvent),
    Zap(RawEvent),
    NoteStats(NoteStats),
    /// A referenced event embedded by the cache
    Mention(RawEvent),
    NoteActions(NoteActions),
    FeedRange(PaginationInfo),
}

/// Kind 0 content; both display name spellings occur in the wild
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataContent {
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name_camel: Option<String>,
    display_name: Option<String>,
    about: Option<String>,
    picture: Option<String>,
    banner: Option<String>,
    nip05: Option<String>,
    lud16: Option<String>,
    website: Option<String>,
}

/// Decode a raw event into a `ProfileEvent`
///
/// Content that does not parse for its kind is `MalformedContent`; kinds
/// outside the recognised set are `UnsupportedKind`.
pub fn decode(event: RawEvent) -> ProfileResult<ProfileEvent> {
    let kind = event.kind;

    let decoded = match kind {
        METADATA => ProfileEvent::Metadata(parse_user_profile(&event)?),
        USER_STATS => ProfileEvent::UserStats(parse_json(kind, &event.content)?),
        FILTERING_REASON => {
            let reason: Option<FilterReason> = parse_json(kind, &event.content)?;
            // Only a block verdict carries a reason
            ProfileEvent::FilteringReason(reason.filter(|r| r.action == FilterAction::Block))
        }
        CONTACTS => ProfileEvent::Contacts {
            created_at: event.created_at,
            follows: event.tag_values("p").map(|p| p.to_string()).collect(),
        },
        USER_FOLLOWER_COUNTS => ProfileEvent::FollowerCounts(parse_json(kind, &event.content)?),
        USER_RELAYS => ProfileEvent::UserRelays(extract_relay_config_from_tags(&event.tags)),
        IS_FOLLOWING => {
            let content = if event.content.trim().is_empty() { "false" } else { event.content.as_str() };
            ProfileEvent::IsFollowing(parse_json(kind, content)?)
        }
        TEXT | REPOST => ProfileEvent::Note(event),
        LONG_FORM => ProfileEvent::Article(event),
        HIGHLIGHT => ProfileEvent::Highlight(event),
        ZAP => ProfileEvent::Zap(event),
        NOTE_STATS => ProfileEvent::NoteStats(parse_json(kind, &event.content)?),
        MENTIONS => ProfileEvent::Mention(parse_json(kind, &event.content)?),
        NOTE_ACTIONS => ProfileEvent::NoteActions(parse_json(kind, &event.content)?),
        FEED_RANGE => ProfileEvent::FeedRange(parse_json(kind, &event.content)?),
        other => return Err(ProfileError::UnsupportedKind(other)),
    };

    Ok(decoded)
}

fn parse_json<T: serde::de::DeserializeOwned>(kind: u32, content: &str) -> ProfileResult<T> {
    serde_json::from_str(content).map_err(|e| ProfileError::content(kind, e))
}

/// Parse a Kind 0 event into a `UserProfile`
///
/// A blank `displayName` falls back to `display_name`; the pubkey, its npub
/// form and the event time are stamped in.
pub fn parse_user_profile(event: &RawEvent) -> ProfileResult<UserProfile> {
    let content: MetadataContent = parse_json(event.kind, &event.content)?;

    let display_name = match content.display_name_camel {
        Some(name) if !name.trim().is_empty() => Some(name),
        _ => content.display_name,
    };

    let npub = nip19::hex_to_npub(&event.pubkey).unwrap_or_else(|| truncate_pubkey(&event.pubkey));

    Ok(UserProfile {
        pubkey: event.pubkey.clone(),
        npub,
        name: content.name,
        display_name,
        about: content.about,
        picture: content.picture,
        banner: content.banner,
        nip05: content.nip05,
        lud16: content.lud16,
        website: content.website,
        created_at: event.created_at,
    })
}
