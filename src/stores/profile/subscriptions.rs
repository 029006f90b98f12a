//! In-flight subscriptions
//!
//! Every logical request gets its own id, `profile_<purpose>_<n>`, drawn from a
//! process-wide counter. Inbound frames are routed by looking the id up here;
//! ids that are not in the table (finished, swept, or issued for an identity
//! that is no longer active) are ignored.

use instant::Instant;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::feed::FeedPage;
use super::kinds::ProfileEvent;
use super::types::{FeedTab, UserProfile};
use super::zaps::ZapPage;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// What a subscription was opened for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscriptionPurpose {
    ProfileInfo,
    IsFollowing,
    ScoredNotes,
    CommonFollowers,
    RecentArticles,
    Feed(FeedTab),
    Future,
    Zaps,
    Contacts,
    Followers,
    Relays,
}

impl SubscriptionPurpose {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ProfileInfo => "info",
            Self::IsFollowing => "following",
            Self::ScoredNotes => "scored",
            Self::CommonFollowers => "cf",
            Self::RecentArticles => "reads_latest",
            Self::Feed(FeedTab::Notes) => "notes",
            Self::Feed(FeedTab::Replies) => "replies",
            Self::Feed(FeedTab::Reads) => "reads",
            Self::Feed(FeedTab::Media) => "media",
            Self::Future => "future",
            Self::Zaps => "zaps",
            Self::Contacts => "contacts",
            Self::Followers => "followers",
            Self::Relays => "relays",
        }
    }
}

/// Allocate a fresh subscription id for `purpose`
pub fn next_subscription_id(purpose: SubscriptionPurpose) -> String {
    let n = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
    format!("profile_{}_{}", purpose.tag(), n)
}

/// Events buffered until the stream for a subscription ends
#[derive(Clone, Debug, PartialEq)]
pub enum PageBuffer {
    Feed(FeedPage),
    Zaps(ZapPage),
    Users(Vec<UserProfile>),
    Empty,
}

impl PageBuffer {
    fn for_purpose(purpose: SubscriptionPurpose) -> Self {
        match purpose {
            SubscriptionPurpose::ScoredNotes
            | SubscriptionPurpose::RecentArticles
            | SubscriptionPurpose::Feed(_)
            | SubscriptionPurpose::Future => PageBuffer::Feed(FeedPage::default()),
            SubscriptionPurpose::Zaps => PageBuffer::Zaps(ZapPage::default()),
            SubscriptionPurpose::CommonFollowers => PageBuffer::Users(Vec::new()),
            _ => PageBuffer::Empty,
        }
    }

    /// Fold an event into the buffer, handing it back if it does not belong
    pub fn absorb(&mut self, event: ProfileEvent) -> Option<ProfileEvent> {
        match self {
            PageBuffer::Feed(page) => page.absorb(event),
            PageBuffer::Zaps(page) => page.absorb(event),
            PageBuffer::Users(users) => match event {
                ProfileEvent::Metadata(user) => {
                    users.push(user);
                    None
                }
                other => Some(other),
            },
            PageBuffer::Empty => Some(event),
        }
    }
}

/// One registered subscription
#[derive(Clone, Debug)]
pub struct PendingSubscription {
    pub purpose: SubscriptionPurpose,
    /// Identity the request was issued for
    pub identity: String,
    pub issued_at: Instant,
    pub buffer: PageBuffer,
    pub events_seen: usize,
}

impl PendingSubscription {
    pub fn new(purpose: SubscriptionPurpose, identity: &str, issued_at: Instant) -> Self {
        Self {
            purpose,
            identity: identity.to_string(),
            issued_at,
            buffer: PageBuffer::for_purpose(purpose),
            events_seen: 0,
        }
    }
}

/// Registration table keyed by subscription id
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    pending: HashMap<String, PendingSubscription>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription and return its id
    pub fn register(&mut self, purpose: SubscriptionPurpose, identity: &str, now: Instant) -> String {
        let id = next_subscription_id(purpose);
        self.pending
            .insert(id.clone(), PendingSubscription::new(purpose, identity, now));
        id
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PendingSubscription> {
        self.pending.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PendingSubscription> {
        self.pending.remove(id)
    }

    /// Drop every subscription matching `predicate`, returning the dropped ones
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<(String, PendingSubscription)>
    where
        F: FnMut(&PendingSubscription) -> bool,
    {
        let ids: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, sub)| predicate(sub))
            .map(|(id, _)| id.clone())
            .collect();

        ids.into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|sub| (id, sub)))
            .collect()
    }

    /// Remove subscriptions issued more than `timeout` before `now`
    pub fn take_expired(&mut self, now: Instant, timeout: Duration) -> Vec<(String, PendingSubscription)> {
        self.remove_where(|sub| sub.issued_at + timeout <= now)
    }

    /// Unregister everything
    pub fn clear(&mut self) -> Vec<(String, PendingSubscription)> {
        self.pending.drain().collect()
    }

    pub fn has_purpose(&self, purpose: SubscriptionPurpose) -> bool {
        self.pending.values().any(|sub| sub.purpose == purpose)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
