//! The profile view and its reducer
//!
//! `ProfileView` is only ever changed through `ProfileView::apply`, one
//! `ProfileUpdate` at a time. Readers get the whole record as a snapshot.

use std::collections::{HashMap, HashSet};

use super::history::ProfileHistory;
use super::subscriptions::SubscriptionPurpose;
use super::types::{
    Article, FeedTab, FilterAction, FilterReason, FollowerCounts, Note, PaginationInfo, UserProfile,
    UserStats, Zap,
};
use super::zaps::ZapResults;
use crate::stores::relay_metadata::RelayMap;
use crate::utils::ContentToken;

/// Notes that arrived after the feed was loaded, waiting to be merged
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FutureNotes {
    pub notes: Vec<Note>,
}

/// Everything the profile page shows for one identity
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileView {
    pub profile_key: Option<String>,
    /// The signed-in user looking at the profile
    pub viewer: Option<String>,

    pub user_profile: Option<UserProfile>,
    pub user_stats: UserStats,
    pub fetched_user_stats: bool,
    pub is_profile_fetched: bool,
    pub filter_reason: Option<FilterReason>,
    pub is_profile_following: bool,
    pub parsed_about: Vec<ContentToken>,
    pub is_about_parsed: bool,

    pub notes: Vec<Note>,
    pub replies: Vec<Note>,
    pub articles: Vec<Article>,
    pub gallery: Vec<Note>,
    pub paging: HashMap<FeedTab, PaginationInfo>,
    pub future: FutureNotes,

    pub sidebar_notes: Vec<Note>,
    pub sidebar_articles: Vec<Article>,
    pub common_followers: Vec<UserProfile>,

    pub zaps: Vec<Zap>,
    pub zapped_notes: Vec<Note>,
    pub zapped_articles: Vec<Article>,
    pub zappers: HashMap<String, UserProfile>,

    pub contacts: Vec<UserProfile>,
    pub followers: Vec<UserProfile>,
    pub following: Vec<String>,
    pub contact_list_date: u64,
    pub profile_stats: FollowerCounts,
    pub relays: RelayMap,

    pub history: ProfileHistory,

    fetching: HashSet<SubscriptionPurpose>,
    /// Events discarded as malformed or of an unknown kind
    pub dropped_events: u64,
}

/// Buckets with their own clear action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Notes,
    Replies,
    Articles,
    Gallery,
    Zaps,
    Contacts,
    FilterReason,
    Future,
}

/// A single change to the view
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileUpdate {
    SetViewer(Option<String>),
    SetProfileKey(Option<String>),
    /// Clear everything held for the previous identity and select `key`
    SwitchIdentity(String),
    /// Clear profile record, stats and sidebar previews; keeps the key
    Reset,
    Clear(Bucket),
    SetFetching(SubscriptionPurpose, bool),

    SetProfile(UserProfile),
    SetStats(UserStats),
    SetFilterReason(Option<FilterReason>),
    SetIsFollowing(bool),
    ProfileFetched { parsed_about: Vec<ContentToken> },

    SetSidebarNotes(Vec<Note>),
    SetSidebarArticles(Vec<Article>),
    SetCommonFollowers(Vec<UserProfile>),

    AppendNotes { tab: FeedTab, notes: Vec<Note>, paging: Option<PaginationInfo> },
    AppendArticles { articles: Vec<Article>, paging: Option<PaginationInfo> },
    SetFuture(Vec<Note>),
    LoadFuture,
    AppendZaps(ZapResults),

    SetFollowing(Vec<String>),
    SetContactListDate(u64),
    PushContact(UserProfile),
    PushFollower(UserProfile),
    RemoveContact(String),
    MergeProfileStats(FollowerCounts),
    SetRelays(RelayMap),

    AddToHistory(UserProfile),
    AddStatsToHistory(UserStats),
    SetHistory(ProfileHistory),
    EventDropped,
}

impl ProfileView {
    pub fn is_fetching(&self, purpose: SubscriptionPurpose) -> bool {
        self.fetching.contains(&purpose)
    }

    /// Whether any query is still outstanding
    pub fn is_fetching_any(&self) -> bool {
        !self.fetching.is_empty()
    }

    pub fn feed(&self, tab: FeedTab) -> &[Note] {
        match tab {
            FeedTab::Notes => &self.notes,
            FeedTab::Replies => &self.replies,
            FeedTab::Media => &self.gallery,
            FeedTab::Reads => &[],
        }
    }

    fn feed_mut(&mut self, tab: FeedTab) -> Option<&mut Vec<Note>> {
        match tab {
            FeedTab::Notes => Some(&mut self.notes),
            FeedTab::Replies => Some(&mut self.replies),
            FeedTab::Media => Some(&mut self.gallery),
            FeedTab::Reads => None,
        }
    }

    /// Oldest time held for `tab`, 0 when the bucket is empty
    ///
    /// Reposts count at the time they were reposted.
    pub fn oldest_in(&self, tab: FeedTab) -> u64 {
        let oldest = match tab {
            FeedTab::Reads => self.articles.iter().map(|a| a.published).min(),
            _ => self.feed(tab).iter().map(Note::effective_created_at).min(),
        };
        oldest.unwrap_or(0)
    }

    /// Apply one update; returns false when nothing changed
    pub fn apply(&mut self, update: ProfileUpdate) -> bool {
        match update {
            ProfileUpdate::SetViewer(viewer) => {
                if self.viewer == viewer {
                    return false;
                }
                self.viewer = viewer;
            }
            ProfileUpdate::SetProfileKey(key) => {
                self.profile_key = key;
            }
            ProfileUpdate::SwitchIdentity(key) => {
                let viewer = self.viewer.take();
                let history = std::mem::take(&mut self.history);
                let dropped_events = self.dropped_events;

                *self = ProfileView {
                    profile_key: Some(key),
                    viewer,
                    history,
                    dropped_events,
                    ..Default::default()
                };
            }
            ProfileUpdate::Reset => {
                self.sidebar_notes.clear();
                self.sidebar_articles.clear();
                self.is_profile_fetched = false;
                self.user_profile = None;
                self.common_followers.clear();
                self.user_stats = UserStats::default();
            }
            ProfileUpdate::Clear(bucket) => self.clear(bucket),
            ProfileUpdate::SetFetching(purpose, fetching) => {
                return if fetching {
                    self.fetching.insert(purpose)
                } else {
                    self.fetching.remove(&purpose)
                };
            }

            ProfileUpdate::SetProfile(profile) => {
                self.user_profile = Some(profile);
            }
            ProfileUpdate::SetStats(stats) => {
                self.user_stats = stats;
                self.fetched_user_stats = true;
            }
            ProfileUpdate::SetFilterReason(reason) => {
                self.filter_reason = reason.filter(|r| r.action == FilterAction::Block);
            }
            ProfileUpdate::SetIsFollowing(following) => {
                self.is_profile_following = following;
            }
            ProfileUpdate::ProfileFetched { parsed_about } => {
                self.is_profile_fetched = true;
                self.parsed_about = parsed_about;
                self.is_about_parsed = true;
            }

            ProfileUpdate::SetSidebarNotes(notes) => {
                self.sidebar_notes = notes;
            }
            ProfileUpdate::SetSidebarArticles(articles) => {
                self.sidebar_articles = articles;
            }
            ProfileUpdate::SetCommonFollowers(users) => {
                self.common_followers = users;
            }

            ProfileUpdate::AppendNotes { tab, notes, paging } => {
                if let Some(feed) = self.feed_mut(tab) {
                    feed.extend(notes);
                }
                if let Some(paging) = paging {
                    self.paging.insert(tab, paging);
                }
            }
            ProfileUpdate::AppendArticles { articles, paging } => {
                self.articles.extend(articles);
                if let Some(paging) = paging {
                    self.paging.insert(FeedTab::Reads, paging);
                }
            }
            ProfileUpdate::SetFuture(notes) => {
                self.future.notes = notes;
            }
            ProfileUpdate::LoadFuture => {
                if self.future.notes.is_empty() {
                    return false;
                }
                let mut merged = std::mem::take(&mut self.future.notes);
                merged.append(&mut self.notes);
                self.notes = merged;
            }
            ProfileUpdate::AppendZaps(results) => {
                self.zaps.extend(results.zaps);
                self.zapped_notes.extend(results.notes);
                self.zapped_articles.extend(results.articles);
                self.zappers.extend(results.zappers);
            }

            ProfileUpdate::SetFollowing(following) => {
                self.following = following;
            }
            ProfileUpdate::SetContactListDate(date) => {
                self.contact_list_date = date;
            }
            ProfileUpdate::PushContact(user) => {
                self.contacts.push(user);
            }
            ProfileUpdate::PushFollower(user) => {
                self.followers.push(user);
            }
            ProfileUpdate::RemoveContact(pubkey) => {
                let before = self.contacts.len();
                self.contacts.retain(|c| c.pubkey != pubkey);
                return self.contacts.len() != before;
            }
            ProfileUpdate::MergeProfileStats(counts) => {
                self.profile_stats.extend(counts);
            }
            ProfileUpdate::SetRelays(relays) => {
                self.relays = relays;
            }

            ProfileUpdate::AddToHistory(profile) => return self.history.add_profile(profile),
            ProfileUpdate::AddStatsToHistory(stats) => return self.history.add_stats(stats),
            ProfileUpdate::SetHistory(history) => {
                self.history = history;
            }
            ProfileUpdate::EventDropped => {
                self.dropped_events += 1;
            }
        }
        true
    }

    fn clear(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::Notes => {
                self.notes.clear();
                self.sidebar_notes.clear();
                self.sidebar_articles.clear();
                self.paging.remove(&FeedTab::Notes);
            }
            Bucket::Replies => {
                self.replies.clear();
                self.paging.remove(&FeedTab::Replies);
            }
            Bucket::Articles => {
                self.articles.clear();
                self.paging.remove(&FeedTab::Reads);
            }
            Bucket::Gallery => {
                self.gallery.clear();
                self.paging.remove(&FeedTab::Media);
            }
            Bucket::Zaps => {
                self.zaps.clear();
                self.zapped_notes.clear();
                self.zapped_articles.clear();
                self.zappers.clear();
            }
            Bucket::Contacts => {
                self.contacts.clear();
                self.followers.clear();
                self.profile_stats.clear();
            }
            Bucket::FilterReason => {
                self.filter_reason = None;
            }
            Bucket::Future => {
                self.future = FutureNotes::default();
            }
        }
    }
}
