//! Records held by the profile view
//!
//! Everything here is plain data. Decoding from raw events lives in `kinds`,
//! page materialisation in `feed` and `zaps`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::format::truncate_pubkey;
use crate::utils::nip19;

// =============================================================================
// Raw Events
// =============================================================================

/// Event record as delivered by the caching service
///
/// Cache-specific kinds carry no id or signature, so both are optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub kind: u32,
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl RawEvent {
    /// Values of every tag named `name` (second element)
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(|k| k == name).unwrap_or(false))
            .filter_map(|tag| tag.get(1).map(|v| v.as_str()))
    }

    /// First value of the tag named `name`
    pub fn first_tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .filter(|tag| tag.first().map(|k| k == name).unwrap_or(false))
            .find_map(|tag| tag.get(1).map(|v| v.as_str()))
    }

    /// Bech32 `note1` form of the event id, falling back to the raw id
    pub fn note_id(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(|id| nip19::note_encode(id).unwrap_or_else(|| id.to_string()))
    }
}

// =============================================================================
// Profile
// =============================================================================

/// User profile metadata from a Kind 0 event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub pubkey: String,
    pub npub: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub about: Option<String>,
    pub picture: Option<String>,
    pub banner: Option<String>,
    pub nip05: Option<String>,
    pub lud16: Option<String>,
    pub website: Option<String>,
    pub created_at: u64,
}

impl UserProfile {
    /// Get the display name, falling back to name or truncated npub
    pub fn get_display_name(&self) -> String {
        if let Some(display_name) = &self.display_name {
            if !display_name.trim().is_empty() {
                return display_name.clone();
            }
        }
        if let Some(name) = &self.name {
            if !name.trim().is_empty() {
                return name.clone();
            }
        }
        truncate_pubkey(&self.npub)
    }
}

/// Aggregate statistics for a profile (cache kind `UserStats`)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub pubkey: String,
    pub follows_count: u64,
    pub followers_count: u64,
    pub note_count: u64,
    pub reply_count: u64,
    pub time_joined: u64,
    pub total_zap_count: u64,
    pub total_satszapped: u64,
    pub relay_count: u64,
    pub media_count: u64,
    pub long_form_note_count: u64,
}

/// Verdict from the content filter
///
/// Anything the filter answers other than `block` or `allow` lands in `Other`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    Block,
    Allow,
    #[default]
    #[serde(other)]
    Other,
}

/// Why a profile is filtered; only ever stored for `Block`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReason {
    #[serde(default)]
    pub action: FilterAction,
    #[serde(default)]
    pub pubkey: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

// =============================================================================
// Note Annotations
// =============================================================================

/// Engagement statistics for a single note (cache kind `NoteStats`)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteStats {
    pub event_id: String,
    pub likes: u64,
    pub replies: u64,
    pub mentions: u64,
    pub reposts: u64,
    pub zaps: u64,
    pub satszapped: u64,
    pub score: f64,
    pub score24h: f64,
}

/// What the viewer already did to a note (cache kind `NoteActions`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteActions {
    pub event_id: String,
    pub liked: bool,
    pub replied: bool,
    pub reposted: bool,
    pub zapped: bool,
}

// =============================================================================
// Pagination
// =============================================================================

/// Boundary of the pages fetched so far for one bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    #[serde(default)]
    pub since: u64,
    #[serde(default)]
    pub until: u64,
    #[serde(default = "default_sort_by", alias = "order_by")]
    pub sort_by: String,
}

fn default_sort_by() -> String {
    "created_at".to_string()
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            since: 0,
            until: 0,
            sort_by: default_sort_by(),
        }
    }
}

/// Tabs of the profile mega feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTab {
    Notes,
    Replies,
    Reads,
    Media,
}

impl FeedTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedTab::Notes => "notes",
            FeedTab::Replies => "replies",
            FeedTab::Reads => "reads",
            FeedTab::Media => "media",
        }
    }
}

impl fmt::Display for FeedTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notes" => Ok(FeedTab::Notes),
            "replies" => Ok(FeedTab::Replies),
            "reads" => Ok(FeedTab::Reads),
            "media" | "gallery" => Ok(FeedTab::Media),
            other => Err(format!("Unknown feed tab: {}", other)),
        }
    }
}

// =============================================================================
// Feed Items
// =============================================================================

/// Repost wrapper: the kind 6 event and who made it
#[derive(Clone, Debug, PartialEq)]
pub struct Repost {
    pub note: RawEvent,
    pub user: Option<UserProfile>,
}

/// A note ready for display
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    /// Bech32 id of the displayed post
    pub note_id: String,
    pub post: RawEvent,
    pub user: Option<UserProfile>,
    pub stats: Option<NoteStats>,
    pub actions: Option<NoteActions>,
    pub repost: Option<Repost>,
}

impl Note {
    /// Creation time used for paging; reposts page by the repost event
    pub fn effective_created_at(&self) -> u64 {
        match &self.repost {
            Some(repost) => repost.note.created_at,
            None => self.post.created_at,
        }
    }

    pub fn score(&self) -> f64 {
        self.stats.as_ref().map(|s| s.score).unwrap_or(0.0)
    }
}

/// A NIP-23 long-form article ready for display
#[derive(Clone, Debug, PartialEq)]
pub struct Article {
    pub id: String,
    pub note_id: String,
    pub pubkey: String,
    pub identifier: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub published: u64,
    pub user: Option<UserProfile>,
    pub stats: Option<NoteStats>,
    pub event: RawEvent,
}

/// A zap received by the profile
#[derive(Clone, Debug, PartialEq)]
pub struct Zap {
    pub id: String,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub amount: u64,
    pub message: String,
    pub created_at: u64,
    pub zapped_event: Option<String>,
}

/// Follower counts keyed by pubkey (cache kind `UserFollowerCounts`)
pub type FollowerCounts = HashMap<String, u64>;
