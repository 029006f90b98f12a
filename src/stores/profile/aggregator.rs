//! Profile aggregation
//!
//! `ProfileAggregator` owns the view for the selected profile. Actions issue
//! cache queries through a `RequestSink`; inbound frames are fed back through
//! `handle_message` and merged by subscription purpose and event kind.
//! Everything runs synchronously on the caller's thread.

use instant::Instant;

use super::config::ProfileConfig;
use super::errors::{ProfileError, ProfileResult};
use super::feed::sort_by_score;
use super::history::ProfileHistory;
use super::instrumentation::{NoopInstrumentation, ProfileInstrumentation};
use super::kinds::{self, ProfileEvent};
use super::messages::RelayMessage;
use super::requests::{CacheEndpoint, MegaFeedSpec, ProfileRequest, RequestSink};
use super::state::{Bucket, ProfileUpdate, ProfileView};
use super::storage::{HistoryStorage, MemoryHistoryStorage};
use super::subscriptions::{PageBuffer, PendingSubscription, SubscriptionPurpose, SubscriptionTable};
use super::types::{FeedTab, RawEvent, UserProfile};
use crate::utils::{nip19, parse_content};

pub struct ProfileAggregator {
    config: ProfileConfig,
    view: ProfileView,
    subscriptions: SubscriptionTable,
    sink: Box<dyn RequestSink>,
    storage: Box<dyn HistoryStorage>,
    instrumentation: Box<dyn ProfileInstrumentation>,
}

impl ProfileAggregator {
    pub fn new(config: ProfileConfig, sink: impl RequestSink + 'static) -> Self {
        Self {
            config,
            view: ProfileView::default(),
            subscriptions: SubscriptionTable::new(),
            sink: Box::new(sink),
            storage: Box::new(MemoryHistoryStorage::new()),
            instrumentation: Box::new(NoopInstrumentation),
        }
    }

    pub fn with_storage(mut self, storage: impl HistoryStorage + 'static) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn with_instrumentation(mut self, instrumentation: impl ProfileInstrumentation + 'static) -> Self {
        self.instrumentation = Box::new(instrumentation);
        self
    }

    pub fn view(&self) -> &ProfileView {
        &self.view
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn pending_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Set the signed-in user; loads the history persisted for them
    pub fn set_viewer(&mut self, viewer: Option<&str>) {
        let viewer = match viewer.map(parse_pubkey).transpose() {
            Ok(viewer) => viewer,
            Err(e) => {
                log::warn!("Ignoring viewer: {}", e);
                None
            }
        };

        if !self.view.apply(ProfileUpdate::SetViewer(viewer.clone())) {
            return;
        }

        let history = match viewer.as_deref() {
            Some(owner) => match self.storage.load(owner) {
                Ok(history) => history.unwrap_or_default(),
                Err(e) => {
                    log::warn!("Failed to load profile history: {}", e);
                    ProfileHistory::default()
                }
            },
            None => ProfileHistory::default(),
        };

        log::debug!("Loaded {} profiles into history", history.profiles.len());
        self.view.apply(ProfileUpdate::SetHistory(history));
    }

    /// Select the profile to show, or deselect with `None`
    ///
    /// Selecting clears every bucket before the first query for the new
    /// identity goes out. Queries still in flight for the old identity are
    /// unregistered and their late results ignored.
    pub fn set_profile_key(&mut self, key: Option<&str>) {
        let Some(raw) = key else {
            self.abandon_all();
            self.view.apply(ProfileUpdate::SetProfileKey(None));
            return;
        };

        let pubkey = match parse_pubkey(raw) {
            Ok(pubkey) => pubkey,
            Err(e) => {
                log::warn!("Not selecting profile: {}", e);
                return;
            }
        };

        log::info!("Selecting profile {}", pubkey);
        self.switch_identity(&pubkey);
        self.issue_profile_queries(&pubkey);
    }

    /// Unregister the previous identity's queries and clear its buckets
    fn switch_identity(&mut self, pubkey: &str) {
        self.abandon_all();
        self.view.apply(ProfileUpdate::SwitchIdentity(pubkey.to_string()));
    }

    /// Profile info, scored notes, common followers, recent articles and,
    /// with a viewer, the is-following check
    fn issue_profile_queries(&mut self, pubkey: &str) {
        let viewer = self.view.viewer.clone();

        self.issue(SubscriptionPurpose::ProfileInfo, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::UserProfile, pubkey).viewer(viewer.as_deref())
        });

        let limit = self.config.sidebar_notes_limit;
        self.issue(SubscriptionPurpose::ScoredNotes, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::ScoredContent, pubkey)
                .viewer(viewer.as_deref())
                .limit(limit)
        });

        let limit = self.config.common_followers_limit;
        self.issue(SubscriptionPurpose::CommonFollowers, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::FollowedBy, pubkey)
                .viewer(viewer.as_deref())
                .limit(limit)
        });

        let limit = self.config.recent_articles_limit;
        self.issue(SubscriptionPurpose::RecentArticles, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::MegaFeed, pubkey)
                .viewer(viewer.as_deref())
                .spec(MegaFeedSpec::for_tab(FeedTab::Reads, pubkey))
                .limit(limit)
        });

        if let Some(viewer) = viewer.as_deref() {
            self.issue(SubscriptionPurpose::IsFollowing, pubkey, |sub| {
                ProfileRequest::new(sub, CacheEndpoint::IsUserFollowing, pubkey).viewer(Some(viewer))
            });
        }
    }

    /// Clear the profile record, stats and previews; keeps the selection
    pub fn reset_profile(&mut self) {
        self.view.apply(ProfileUpdate::Reset);
    }

    pub fn clear_notes(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Notes));
    }

    pub fn clear_replies(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Replies));
    }

    pub fn clear_articles(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Articles));
    }

    pub fn clear_gallery(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Gallery));
    }

    pub fn clear_zaps(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Zaps));
    }

    pub fn clear_contacts(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::Contacts));
    }

    pub fn clear_filter_reason(&mut self) {
        self.view.apply(ProfileUpdate::Clear(Bucket::FilterReason));
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    /// Request one page of a profile tab
    ///
    /// An `offset` of 0 defaults to the oldest time already held for the tab.
    pub fn get_profile_mega_feed(&mut self, identity: Option<&str>, tab: FeedTab, until: u64, limit: u32, offset: u64) {
        let Some(pubkey) = identity else {
            return;
        };

        let offset = if offset > 0 { offset } else { self.view.oldest_in(tab) };
        let viewer = self.view.viewer.clone();

        self.issue(SubscriptionPurpose::Feed(tab), pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::MegaFeed, pubkey)
                .viewer(viewer.as_deref())
                .spec(MegaFeedSpec::for_tab(tab, pubkey))
                .limit(limit)
                .until(until)
                .offset(offset)
        });
    }

    /// Request the page after the last one stored for `tab`
    pub fn get_profile_mega_feed_next_page(&mut self, identity: Option<&str>, tab: FeedTab) {
        let paging = self.view.paging.get(&tab).cloned().unwrap_or_default();
        let page_size = self.config.page_size;
        self.get_profile_mega_feed(identity, tab, paging.since, page_size, 0);
    }

    /// Look for notes newer than the newest one held
    pub fn check_for_new_notes(&mut self, identity: Option<&str>) {
        let Some(pubkey) = identity else {
            return;
        };

        if self.view.future.notes.len() > self.config.future_notes_cap {
            return;
        }

        let since = self
            .view
            .notes
            .first()
            .map(|note| note.effective_created_at())
            .unwrap_or(0);

        self.view.apply(ProfileUpdate::Clear(Bucket::Future));

        let viewer = self.view.viewer.clone();
        self.issue(SubscriptionPurpose::Future, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::Feed, pubkey)
                .viewer(viewer.as_deref())
                .since(since)
        });
    }

    /// Move staged new notes to the top of the notes feed
    pub fn load_future_content(&mut self) {
        self.view.apply(ProfileUpdate::LoadFuture);
    }

    // =========================================================================
    // Zaps
    // =========================================================================

    pub fn fetch_zap_list(&mut self, identity: Option<&str>, until: u64, offset: u64) {
        let Some(pubkey) = identity else {
            return;
        };

        let limit = self.config.page_size;
        self.issue(SubscriptionPurpose::Zaps, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::UserZaps, pubkey)
                .limit(limit)
                .until(until)
                .offset(offset)
        });
    }

    /// Continue the zap list from the last zap held
    pub fn fetch_next_zaps_page(&mut self) {
        let Some(last) = self.view.zaps.last() else {
            return;
        };

        let until = last.created_at;
        if until == 0 {
            return;
        }

        if let Some(pubkey) = self.view.profile_key.clone() {
            self.fetch_zap_list(Some(&pubkey), until, 0);
        }
    }

    // =========================================================================
    // Contacts, followers, relays
    // =========================================================================

    pub fn fetch_contact_list(&mut self, identity: Option<&str>, extended: bool) {
        let Some(pubkey) = identity else {
            return;
        };

        self.issue(SubscriptionPurpose::Contacts, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::ContactList, pubkey).extended(extended)
        });
    }

    pub fn fetch_follower_list(&mut self, identity: Option<&str>) {
        let Some(pubkey) = identity else {
            return;
        };

        self.issue(SubscriptionPurpose::Followers, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::UserFollowers, pubkey)
        });
    }

    pub fn fetch_relay_list(&mut self, identity: Option<&str>) {
        let Some(pubkey) = identity else {
            return;
        };

        self.issue(SubscriptionPurpose::Relays, pubkey, |sub| {
            ProfileRequest::new(sub, CacheEndpoint::UserRelays, pubkey)
        });
    }

    /// Append the profile matching `pubkey` from `source` to the contacts
    pub fn add_contact(&mut self, pubkey: &str, source: &[UserProfile]) {
        if let Some(contact) = source.iter().find(|c| c.pubkey == pubkey) {
            self.view.apply(ProfileUpdate::PushContact(contact.clone()));
        }
    }

    pub fn remove_contact(&mut self, pubkey: &str) {
        self.view.apply(ProfileUpdate::RemoveContact(pubkey.to_string()));
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn add_profile_to_history(&mut self, profile: UserProfile) {
        if self.view.apply(ProfileUpdate::AddToHistory(profile)) {
            self.persist_history();
        }
    }

    fn persist_history(&self) {
        let Some(owner) = self.view.viewer.as_deref() else {
            return;
        };

        if let Err(e) = self.storage.save(owner, &self.view.history) {
            log::warn!("Failed to save profile history: {}", e);
        }
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Handle a text frame from the socket
    pub fn handle_raw(&mut self, text: &str) {
        match RelayMessage::from_json(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => log::warn!("Dropping frame: {}", e),
        }
    }

    pub fn handle_message(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::Notice(text) => log::info!("Cache notice: {}", text),
            RelayMessage::Event { sub_id, event } => self.handle_event(&sub_id, event),
            RelayMessage::Events { sub_id, events } => {
                if self.subscriptions.get_mut(&sub_id).is_none() {
                    log::debug!("Ignoring batch for unknown subscription {}", sub_id);
                    return;
                }
                for event in events {
                    self.handle_event(&sub_id, event);
                }
                // A batch is the whole answer
                self.complete(&sub_id);
            }
            RelayMessage::Eose { sub_id } => self.complete(&sub_id),
        }
    }

    fn handle_event(&mut self, sub_id: &str, event: RawEvent) {
        let Some(pending) = self.subscriptions.get_mut(sub_id) else {
            log::debug!("Ignoring event for unknown subscription {}", sub_id);
            return;
        };

        pending.events_seen += 1;
        let purpose = pending.purpose;
        if pending.events_seen == 1 {
            self.instrumentation
                .first_event(sub_id, purpose, pending.issued_at.elapsed());
        }

        let decoded = match kinds::decode(event) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.drop_event(sub_id, &e);
                return;
            }
        };

        if let (PageBuffer::Feed(page), ProfileEvent::Note(message)) = (&pending.buffer, &decoded) {
            if purpose == SubscriptionPurpose::ScoredNotes
                && message.id.is_some()
                && page.messages.last().and_then(RawEvent::note_id) == message.note_id()
            {
                log::debug!("Skipping repeated note on {}", sub_id);
                return;
            }
        }

        if let Some(event) = pending.buffer.absorb(decoded) {
            self.apply_event(sub_id, purpose, event);
        }
    }

    /// Events that update the view directly rather than through a page buffer
    fn apply_event(&mut self, sub_id: &str, purpose: SubscriptionPurpose, event: ProfileEvent) {
        use SubscriptionPurpose as P;

        match (purpose, event) {
            (P::ProfileInfo, ProfileEvent::Metadata(profile)) => {
                self.view.apply(ProfileUpdate::SetProfile(profile.clone()));
                self.add_profile_to_history(profile);
            }
            (P::ProfileInfo, ProfileEvent::UserStats(stats)) => {
                self.view.apply(ProfileUpdate::SetStats(stats.clone()));
                if self.view.apply(ProfileUpdate::AddStatsToHistory(stats)) {
                    self.persist_history();
                }
            }
            (P::ProfileInfo, ProfileEvent::FilteringReason(reason)) => {
                self.view.apply(ProfileUpdate::SetFilterReason(reason));
            }
            (P::IsFollowing, ProfileEvent::IsFollowing(following)) => {
                self.view.apply(ProfileUpdate::SetIsFollowing(following));
            }
            (P::Contacts, ProfileEvent::Contacts { created_at, follows }) => {
                self.view.apply(ProfileUpdate::SetContactListDate(created_at));
                self.view.apply(ProfileUpdate::SetFollowing(follows));
            }
            (P::Contacts, ProfileEvent::Metadata(profile)) => {
                self.view.apply(ProfileUpdate::PushContact(profile));
            }
            (P::Followers, ProfileEvent::Metadata(profile)) => {
                self.view.apply(ProfileUpdate::PushFollower(profile));
            }
            (P::Contacts | P::Followers, ProfileEvent::FollowerCounts(counts)) => {
                self.view.apply(ProfileUpdate::MergeProfileStats(counts));
            }
            (P::Relays, ProfileEvent::UserRelays(relays)) => {
                self.view.apply(ProfileUpdate::SetRelays(relays));
            }
            (purpose, other) => {
                log::debug!("[{}] {:?} has no use for {:?}", sub_id, purpose, other);
            }
        }
    }

    fn drop_event(&mut self, sub_id: &str, error: &ProfileError) {
        match error {
            ProfileError::UnsupportedKind(_) => log::debug!("[{}] {}", sub_id, error),
            _ => log::warn!("[{}] Dropping event: {}", sub_id, error),
        }
        self.view.apply(ProfileUpdate::EventDropped);
        self.instrumentation.event_dropped(sub_id, &error.to_string());
    }

    /// End of stream: materialise the buffer and unregister
    fn complete(&mut self, sub_id: &str) {
        let Some(pending) = self.subscriptions.remove(sub_id) else {
            log::debug!("Ignoring end of stream for unknown subscription {}", sub_id);
            return;
        };

        let purpose = pending.purpose;
        self.instrumentation
            .query_completed(sub_id, purpose, pending.issued_at.elapsed());

        self.finish(pending);
        self.refresh_fetching(purpose);
    }

    fn finish(&mut self, pending: PendingSubscription) {
        use SubscriptionPurpose as P;

        let update = match (pending.purpose, pending.buffer) {
            (P::ProfileInfo, _) => {
                let parsed_about = self
                    .view
                    .user_profile
                    .as_ref()
                    .and_then(|p| p.about.as_deref())
                    .map(parse_content)
                    .unwrap_or_default();
                ProfileUpdate::ProfileFetched { parsed_about }
            }
            (P::ScoredNotes, PageBuffer::Feed(page)) => ProfileUpdate::SetSidebarNotes(sort_by_score(page.to_notes())),
            (P::RecentArticles, PageBuffer::Feed(page)) => ProfileUpdate::SetSidebarArticles(page.to_articles()),
            (P::CommonFollowers, PageBuffer::Users(users)) => ProfileUpdate::SetCommonFollowers(
                users
                    .into_iter()
                    .filter(|user| user.pubkey != pending.identity)
                    .collect(),
            ),
            (P::Feed(FeedTab::Reads), PageBuffer::Feed(page)) => ProfileUpdate::AppendArticles {
                articles: page.to_articles(),
                paging: page.paging,
            },
            (P::Feed(tab), PageBuffer::Feed(page)) => ProfileUpdate::AppendNotes {
                tab,
                notes: page.to_notes(),
                paging: page.paging,
            },
            (P::Future, PageBuffer::Feed(page)) => {
                let notes = page
                    .to_notes()
                    .into_iter()
                    .filter(|note| !self.view.notes.iter().any(|held| held.note_id == note.note_id))
                    .collect();
                ProfileUpdate::SetFuture(notes)
            }
            (P::Zaps, PageBuffer::Zaps(page)) => ProfileUpdate::AppendZaps(page.into_results()),
            _ => return,
        };

        self.view.apply(update);
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a subscription and send its request
    ///
    /// A request that cannot be sent is unregistered on the spot so its
    /// fetching flag does not stay set.
    fn issue<F>(&mut self, purpose: SubscriptionPurpose, identity: &str, build: F)
    where
        F: FnOnce(String) -> ProfileRequest,
    {
        let sub_id = self.subscriptions.register(purpose, identity, Instant::now());
        self.view.apply(ProfileUpdate::SetFetching(purpose, true));

        let request = build(sub_id.clone());
        match self.sink.send_request(&request) {
            Ok(()) => self.instrumentation.query_issued(&sub_id, purpose),
            Err(e) => {
                log::warn!("[{}] Failed to send request: {}", sub_id, e);
                self.subscriptions.remove(&sub_id);
                self.refresh_fetching(purpose);
            }
        }
    }

    fn refresh_fetching(&mut self, purpose: SubscriptionPurpose) {
        let active = self.subscriptions.has_purpose(purpose);
        self.view.apply(ProfileUpdate::SetFetching(purpose, active));
    }

    fn abandon_all(&mut self) {
        for (sub_id, pending) in self.subscriptions.clear() {
            log::debug!("Abandoning {} ({:?})", sub_id, pending.purpose);
            self.close(&sub_id);
            self.refresh_fetching(pending.purpose);
        }
    }

    fn close(&self, sub_id: &str) {
        if let Err(e) = self.sink.close_subscription(sub_id) {
            log::debug!("[{}] Failed to close subscription: {}", sub_id, e);
        }
    }

    /// Give up on queries older than the configured timeout
    pub fn sweep_timeouts(&mut self) {
        self.sweep_timeouts_at(Instant::now());
    }

    pub fn sweep_timeouts_at(&mut self, now: Instant) {
        let expired = self
            .subscriptions
            .take_expired(now, self.config.fetch_timeout());

        for (sub_id, pending) in expired {
            self.instrumentation.query_timed_out(&sub_id, pending.purpose);
            self.close(&sub_id);
            self.refresh_fetching(pending.purpose);
        }
    }
}

fn parse_pubkey(raw: &str) -> ProfileResult<String> {
    nip19::normalize_pubkey(raw.trim()).map_err(ProfileError::InvalidPubkey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::profile::kinds::{
        CONTACTS, FEED_RANGE, FILTERING_REASON, IS_FOLLOWING, LONG_FORM, METADATA, NOTE_STATS, TEXT, USER_FOLLOWER_COUNTS,
        USER_RELAYS, USER_STATS, ZAP,
    };
    use crate::stores::profile::storage::MemoryHistoryStorage;
    use crate::stores::profile::types::FilterAction;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    const ALICE: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const BOB: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
    const VIEWER: &str = "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245";

    #[derive(Clone, Default)]
    struct RecordingSink {
        requests: Rc<RefCell<Vec<ProfileRequest>>>,
        closed: Rc<RefCell<Vec<String>>>,
        /// REQ and CLOSE in the order they went out
        wire: Rc<RefCell<Vec<String>>>,
        fail: Rc<Cell<bool>>,
    }

    impl RecordingSink {
        fn last(&self, endpoint: CacheEndpoint) -> ProfileRequest {
            self.requests
                .borrow()
                .iter()
                .rev()
                .find(|r| r.endpoint == endpoint)
                .cloned()
                .expect("request was sent")
        }

        fn count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl RequestSink for RecordingSink {
        fn send_request(&self, request: &ProfileRequest) -> ProfileResult<()> {
            if self.fail.get() {
                return Err(ProfileError::NotConnected);
            }
            self.requests.borrow_mut().push(request.clone());
            self.wire.borrow_mut().push(format!("REQ {}", request.subscription));
            Ok(())
        }

        fn close_subscription(&self, sub_id: &str) -> ProfileResult<()> {
            self.closed.borrow_mut().push(sub_id.to_string());
            self.wire.borrow_mut().push(format!("CLOSE {}", sub_id));
            Ok(())
        }
    }

    fn setup() -> (ProfileAggregator, RecordingSink) {
        let sink = RecordingSink::default();
        (ProfileAggregator::new(ProfileConfig::default(), sink.clone()), sink)
    }

    fn raw(kind: u32, pubkey: &str, created_at: u64, content: &str) -> RawEvent {
        RawEvent {
            kind,
            pubkey: pubkey.to_string(),
            created_at,
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn text_note(id: &str, created_at: u64) -> RawEvent {
        RawEvent {
            id: Some(id.to_string()),
            ..raw(TEXT, ALICE, created_at, "hello")
        }
    }

    fn metadata(pubkey: &str, name: &str) -> RawEvent {
        raw(METADATA, pubkey, 1, &format!(r#"{{"name":"{}","about":"gm #nostr"}}"#, name))
    }

    fn event(agg: &mut ProfileAggregator, sub_id: &str, event: RawEvent) {
        agg.handle_message(RelayMessage::Event { sub_id: sub_id.to_string(), event });
    }

    fn eose(agg: &mut ProfileAggregator, sub_id: &str) {
        agg.handle_message(RelayMessage::Eose { sub_id: sub_id.to_string() });
    }

    fn profile(pubkey: &str) -> UserProfile {
        UserProfile { pubkey: pubkey.to_string(), ..Default::default() }
    }

    #[test]
    fn test_set_profile_key_issues_previews() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));

        assert_eq!(sink.count(), 4);
        assert_eq!(sink.last(CacheEndpoint::ScoredContent).limit, Some(8));
        assert_eq!(sink.last(CacheEndpoint::FollowedBy).limit, Some(6));
        let articles = sink.last(CacheEndpoint::MegaFeed);
        assert_eq!(articles.limit, Some(2));
        assert_eq!(articles.spec, Some(MegaFeedSpec::for_tab(FeedTab::Reads, ALICE)));
        assert!(agg.view().is_fetching(SubscriptionPurpose::ScoredNotes));

        let (mut agg, sink) = setup();
        agg.set_viewer(Some(VIEWER));
        agg.set_profile_key(Some(ALICE));
        assert_eq!(sink.count(), 5);
        assert_eq!(sink.last(CacheEndpoint::IsUserFollowing).user_pubkey.as_deref(), Some(VIEWER));
    }

    #[test]
    fn test_npub_key_is_normalised_and_garbage_ignored() {
        let (mut agg, sink) = setup();
        let npub = nip19::hex_to_npub(ALICE).unwrap();
        agg.set_profile_key(Some(&npub));
        assert_eq!(agg.view().profile_key.as_deref(), Some(ALICE));

        let before = sink.count();
        agg.set_profile_key(Some("not-a-key"));
        assert_eq!(sink.count(), before);
        assert_eq!(agg.view().profile_key.as_deref(), Some(ALICE));
    }

    #[test]
    fn test_profile_info_stream() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;

        event(&mut agg, &sub, metadata(ALICE, "fiatjaf"));
        event(&mut agg, &sub, raw(USER_STATS, ALICE, 1, &format!(r#"{{"pubkey":"{}","note_count":42}}"#, ALICE)));
        assert!(!agg.view().is_profile_fetched);
        assert!(agg.view().fetched_user_stats);
        eose(&mut agg, &sub);

        let view = agg.view();
        assert_eq!(view.user_profile.as_ref().and_then(|p| p.name.as_deref()), Some("fiatjaf"));
        assert_eq!(view.user_stats.note_count, 42);
        assert!(view.is_profile_fetched);
        assert!(view.is_about_parsed);
        assert!(view.parsed_about.contains(&crate::utils::ContentToken::Hashtag("nostr".to_string())));
        assert_eq!(view.history.profiles[0].pubkey, ALICE);
        assert_eq!(view.history.stats[ALICE].note_count, 42);
        assert!(!view.is_fetching(SubscriptionPurpose::ProfileInfo));
    }

    #[test]
    fn test_batch_matches_individual_events() {
        let stream = vec![
            metadata(ALICE, "first"),
            raw(USER_STATS, ALICE, 1, r#"{"note_count":1}"#),
            metadata(ALICE, "second"),
            raw(USER_STATS, ALICE, 2, r#"{"note_count":2}"#),
        ];

        let (mut single, sink) = setup();
        single.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;
        for e in stream.clone() {
            event(&mut single, &sub, e);
        }
        eose(&mut single, &sub);

        let (mut batched, sink) = setup();
        batched.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;
        batched.handle_message(RelayMessage::Events { sub_id: sub, events: stream });

        assert_eq!(single.view().user_profile, batched.view().user_profile);
        assert_eq!(single.view().user_stats, batched.view().user_stats);
        assert_eq!(batched.view().user_stats.note_count, 2);
        assert!(batched.view().is_profile_fetched);
    }

    #[test]
    fn test_switching_identity_discards_stale_results() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let alice_info = sink.last(CacheEndpoint::UserProfile).subscription;

        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Notes, 0, 20, 0);
        let alice_feed = sink.last(CacheEndpoint::MegaFeed).subscription;
        event(&mut agg, &alice_feed, text_note("a1", 100));
        eose(&mut agg, &alice_feed);
        assert_eq!(agg.view().notes.len(), 1);

        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Replies, 0, 20, 0);
        let alice_replies = sink.last(CacheEndpoint::MegaFeed).subscription;

        agg.set_profile_key(Some(BOB));
        assert!(agg.view().notes.is_empty());
        assert!(agg.view().user_profile.is_none());
        assert!(sink.closed.borrow().contains(&alice_replies));

        // late answers for alice
        event(&mut agg, &alice_info, metadata(ALICE, "alice"));
        event(&mut agg, &alice_replies, text_note("a2", 90));
        eose(&mut agg, &alice_replies);

        assert!(agg.view().user_profile.is_none());
        assert!(agg.view().replies.is_empty());

        let bob_info = sink.last(CacheEndpoint::UserProfile).subscription;
        event(&mut agg, &bob_info, metadata(BOB, "bob"));
        assert_eq!(agg.view().user_profile.as_ref().map(|p| p.pubkey.as_str()), Some(BOB));
    }

    #[test]
    fn test_old_identity_cleared_before_new_queries_go_out() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let info = sink.last(CacheEndpoint::UserProfile).subscription;
        event(&mut agg, &info, metadata(ALICE, "alice"));

        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Notes, 0, 20, 0);
        let feed = sink.last(CacheEndpoint::MegaFeed).subscription;
        event(&mut agg, &feed, text_note("a1", 100));
        eose(&mut agg, &feed);
        agg.fetch_contact_list(Some(ALICE), false);
        let contacts = sink.last(CacheEndpoint::ContactList).subscription;
        event(&mut agg, &contacts, metadata(BOB, "bob"));

        // First phase only: nothing has been sent for bob yet
        let sent = sink.count();
        agg.switch_identity(BOB);
        assert_eq!(sink.count(), sent);
        assert_eq!(agg.view().profile_key.as_deref(), Some(BOB));
        assert!(agg.view().user_profile.is_none());
        assert!(agg.view().notes.is_empty());
        assert!(agg.view().contacts.is_empty());
        assert!(agg.view().paging.is_empty());
        assert!(!agg.view().is_fetching_any());
        assert_eq!(agg.pending_subscriptions(), 0);

        agg.issue_profile_queries(BOB);
        let requests = sink.requests.borrow();
        assert_eq!(requests.len(), sent + 4);
        assert!(requests[sent..].iter().all(|r| r.pubkey == BOB));
    }

    #[test]
    fn test_switch_closes_old_subscriptions_before_first_request() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        sink.wire.borrow_mut().clear();

        agg.set_profile_key(Some(BOB));
        let wire = sink.wire.borrow();
        let first_req = wire.iter().position(|w| w.starts_with("REQ")).unwrap();
        assert_eq!(first_req, 4);
        assert!(wire[..first_req].iter().all(|w| w.starts_with("CLOSE")));
    }

    #[test]
    fn test_deselect_unregisters_and_keeps_buckets() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let info = sink.last(CacheEndpoint::UserProfile).subscription;
        event(&mut agg, &info, metadata(ALICE, "alice"));

        agg.set_profile_key(None);
        assert_eq!(agg.view().profile_key, None);
        assert_eq!(agg.pending_subscriptions(), 0);
        assert!(!agg.view().is_fetching_any());
        assert!(agg.view().user_profile.is_some());
    }

    #[test]
    fn test_filter_reason_block_and_allow() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;

        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, r#"{"action":"block","group":"spam"}"#));
        assert_eq!(agg.view().filter_reason.as_ref().map(|r| r.action), Some(FilterAction::Block));

        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, r#"{"action":"block","pubkey":"x"}"#));
        assert_eq!(agg.view().filter_reason.as_ref().and_then(|r| r.pubkey.as_deref()), Some("x"));

        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, r#"{"action":"allow"}"#));
        assert_eq!(agg.view().filter_reason, None);
    }

    #[test]
    fn test_unknown_filter_verdict_clears_block() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;
        let block = r#"{"action":"block","group":"spam"}"#;

        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, block));
        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, r#"{"action":"mute"}"#));
        assert_eq!(agg.view().filter_reason, None);

        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, block));
        event(&mut agg, &sub, raw(FILTERING_REASON, ALICE, 1, "{}"));
        assert_eq!(agg.view().filter_reason, None);
        assert_eq!(agg.view().dropped_events, 0);
    }

    #[test]
    fn test_malformed_event_is_dropped() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;

        event(&mut agg, &sub, raw(METADATA, ALICE, 1, "{broken"));
        event(&mut agg, &sub, raw(7, ALICE, 1, "+"));
        event(&mut agg, &sub, metadata(ALICE, "fine"));

        assert_eq!(agg.view().dropped_events, 2);
        assert_eq!(agg.view().user_profile.as_ref().and_then(|p| p.name.as_deref()), Some("fine"));

        agg.handle_raw("not json");
        agg.handle_raw(r#"["NOTICE","slow down"]"#);
        assert_eq!(agg.view().dropped_events, 2);
    }

    #[test]
    fn test_scored_notes_sorted_and_deduplicated() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::ScoredContent).subscription;

        event(&mut agg, &sub, text_note("low", 1));
        event(&mut agg, &sub, text_note("high", 2));
        event(&mut agg, &sub, text_note("high", 2));
        event(&mut agg, &sub, raw(NOTE_STATS, "", 0, r#"{"event_id":"low","score":1.0}"#));
        event(&mut agg, &sub, raw(NOTE_STATS, "", 0, r#"{"event_id":"high","score":9.0}"#));
        assert!(agg.view().sidebar_notes.is_empty());
        eose(&mut agg, &sub);

        let ids: Vec<_> = agg.view().sidebar_notes.iter().map(|n| n.note_id.clone()).collect();
        assert_eq!(ids, vec!["high", "low"]);
        assert!(!agg.view().is_fetching(SubscriptionPurpose::ScoredNotes));
    }

    #[test]
    fn test_common_followers_exclude_profile() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::FollowedBy).subscription;

        agg.handle_message(RelayMessage::Events {
            sub_id: sub,
            events: vec![metadata(ALICE, "alice"), metadata(BOB, "bob")],
        });

        let followers: Vec<_> = agg.view().common_followers.iter().map(|u| u.pubkey.as_str()).collect();
        assert_eq!(followers, vec![BOB]);
    }

    #[test]
    fn test_recent_articles_preview() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::MegaFeed).subscription;

        let mut article = raw(LONG_FORM, ALICE, 500, "# Essay");
        article.id = Some("art".to_string());
        article.tags = vec![vec!["title".to_string(), "Essay".to_string()]];
        agg.handle_message(RelayMessage::Events { sub_id: sub, events: vec![article] });

        assert_eq!(agg.view().sidebar_articles.len(), 1);
        assert_eq!(agg.view().sidebar_articles[0].title, "Essay");
        assert!(!agg.view().is_fetching(SubscriptionPurpose::RecentArticles));
    }

    #[test]
    fn test_mega_feed_pages_append_in_order() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));

        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Notes, 0, 20, 0);
        let first = sink.last(CacheEndpoint::MegaFeed);
        assert_eq!(first.offset, None);
        assert!(agg.view().is_fetching(SubscriptionPurpose::Feed(FeedTab::Notes)));

        event(&mut agg, &first.subscription, text_note("n3", 300));
        event(&mut agg, &first.subscription, text_note("n2", 200));
        event(&mut agg, &first.subscription, raw(FEED_RANGE, "", 0, r#"{"since":200,"until":300,"order_by":"created_at"}"#));
        eose(&mut agg, &first.subscription);
        assert!(!agg.view().is_fetching(SubscriptionPurpose::Feed(FeedTab::Notes)));
        assert_eq!(agg.view().paging[&FeedTab::Notes].since, 200);

        agg.get_profile_mega_feed_next_page(Some(ALICE), FeedTab::Notes);
        let second = sink.last(CacheEndpoint::MegaFeed);
        assert_eq!(second.until, Some(200));
        assert_eq!(second.offset, Some(200));
        assert_eq!(second.limit, Some(20));

        event(&mut agg, &second.subscription, text_note("n1", 100));
        eose(&mut agg, &second.subscription);

        let ids: Vec<_> = agg.view().notes.iter().map(|n| n.note_id.clone()).collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn test_mega_feed_without_identity_is_noop() {
        let (mut agg, sink) = setup();
        agg.get_profile_mega_feed(None, FeedTab::Media, 0, 20, 0);
        agg.fetch_zap_list(None, 0, 0);
        agg.fetch_contact_list(None, true);
        agg.check_for_new_notes(None);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_reads_tab_fills_articles() {
        let (mut agg, sink) = setup();
        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Reads, 0, 20, 0);
        let sub = sink.last(CacheEndpoint::MegaFeed).subscription;

        let mut article = raw(LONG_FORM, ALICE, 700, "body");
        article.id = Some("a".to_string());
        agg.handle_message(RelayMessage::Events { sub_id: sub, events: vec![article] });

        assert_eq!(agg.view().articles.len(), 1);
        assert!(agg.view().notes.is_empty());
        assert_eq!(agg.view().oldest_in(FeedTab::Reads), 700);
    }

    #[test]
    fn test_zap_pages() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));

        agg.fetch_next_zaps_page();
        assert!(sink.requests.borrow().iter().all(|r| r.endpoint != CacheEndpoint::UserZaps));

        agg.fetch_zap_list(Some(ALICE), 0, 0);
        let sub = sink.last(CacheEndpoint::UserZaps).subscription;

        let mut receipt = raw(ZAP, "server", 1_000, "");
        receipt.id = Some("z1".to_string());
        receipt.tags = vec![
            vec!["p".to_string(), ALICE.to_string()],
            vec!["bolt11".to_string(), "lnbc210n1xyz".to_string()],
            vec!["description".to_string(), format!(r#"{{"pubkey":"{}","content":"thanks"}}"#, BOB)],
        ];
        event(&mut agg, &sub, receipt);
        event(&mut agg, &sub, metadata(BOB, "bob"));
        event(&mut agg, &sub, text_note("zapped", 900));
        eose(&mut agg, &sub);

        let view = agg.view();
        assert_eq!(view.zaps.len(), 1);
        assert_eq!(view.zaps[0].amount, 21);
        assert_eq!(view.zaps[0].sender.as_deref(), Some(BOB));
        assert_eq!(view.zapped_notes.len(), 1);
        assert!(view.zappers.contains_key(BOB));
        assert!(!view.is_fetching(SubscriptionPurpose::Zaps));

        agg.fetch_next_zaps_page();
        assert_eq!(sink.last(CacheEndpoint::UserZaps).until, Some(1_000));

        agg.clear_zaps();
        assert!(agg.view().zaps.is_empty());
        assert!(agg.view().zappers.is_empty());
    }

    #[test]
    fn test_next_zaps_page_without_zaps_changes_nothing() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let before = agg.view().clone();
        let sent = sink.count();

        agg.fetch_next_zaps_page();

        assert_eq!(sink.count(), sent);
        assert_eq!(agg.view(), &before);
    }

    #[test]
    fn test_contact_list() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        agg.fetch_contact_list(Some(ALICE), true);
        let request = sink.last(CacheEndpoint::ContactList);
        assert_eq!(request.extended_response, Some(true));
        assert!(agg.view().is_fetching(SubscriptionPurpose::Contacts));

        let mut contacts = raw(CONTACTS, ALICE, 1_234, "");
        contacts.tags = vec![
            vec!["p".to_string(), BOB.to_string()],
            vec!["p".to_string(), VIEWER.to_string()],
        ];
        event(&mut agg, &request.subscription, contacts);
        event(&mut agg, &request.subscription, metadata(BOB, "bob"));
        event(&mut agg, &request.subscription, metadata(VIEWER, "viewer"));
        event(&mut agg, &request.subscription, raw(USER_FOLLOWER_COUNTS, "", 0, &format!(r#"{{"{}":10}}"#, BOB)));
        eose(&mut agg, &request.subscription);

        let view = agg.view();
        assert_eq!(view.contact_list_date, 1_234);
        assert_eq!(view.following, vec![BOB.to_string(), VIEWER.to_string()]);
        assert_eq!(view.contacts.len(), 2);
        assert_eq!(view.profile_stats[BOB], 10);
        assert!(!view.is_fetching(SubscriptionPurpose::Contacts));
    }

    #[test]
    fn test_follower_and_relay_lists() {
        let (mut agg, sink) = setup();
        agg.fetch_follower_list(Some(ALICE));
        let followers = sink.last(CacheEndpoint::UserFollowers).subscription;
        agg.fetch_relay_list(Some(ALICE));
        let relays = sink.last(CacheEndpoint::UserRelays).subscription;

        event(&mut agg, &followers, metadata(BOB, "bob"));
        let mut relay_list = raw(USER_RELAYS, ALICE, 1, "");
        relay_list.tags = vec![vec!["r".to_string(), "wss://nos.lol".to_string(), "read".to_string()]];
        event(&mut agg, &relays, relay_list);
        eose(&mut agg, &relays);

        assert!(agg.view().is_fetching(SubscriptionPurpose::Followers));
        assert!(!agg.view().is_fetching(SubscriptionPurpose::Relays));
        eose(&mut agg, &followers);

        assert_eq!(agg.view().followers.len(), 1);
        assert!(agg.view().relays["wss://nos.lol"].read);
        assert_eq!(agg.pending_subscriptions(), 0);
    }

    #[test]
    fn test_add_and_remove_contact() {
        let (mut agg, _) = setup();
        for pk in ["a", "b", "c"] {
            agg.add_contact(pk, &[profile(pk)]);
        }
        agg.remove_contact("b");
        let contacts: Vec<_> = agg.view().contacts.iter().map(|c| c.pubkey.clone()).collect();
        assert_eq!(contacts, vec!["a", "c"]);

        agg.add_contact("b", &[profile("b")]);
        agg.add_contact("z", &[profile("b")]);
        let contacts: Vec<_> = agg.view().contacts.iter().map(|c| c.pubkey.clone()).collect();
        assert_eq!(contacts, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_history_ring_is_persisted_for_viewer() {
        let sink = RecordingSink::default();
        let storage = MemoryHistoryStorage::new();
        let mut agg = ProfileAggregator::new(ProfileConfig::default(), sink).with_storage(storage.clone());
        agg.set_viewer(Some(VIEWER));

        for i in 0..11 {
            agg.add_profile_to_history(profile(&format!("pk{}", i)));
        }
        assert_eq!(agg.view().history.profiles.len(), 10);
        assert_eq!(agg.view().history.profiles[0].pubkey, "pk10");

        agg.add_profile_to_history(profile("pk5"));
        assert_eq!(agg.view().history.profiles.len(), 10);
        assert_eq!(agg.view().history.profiles[0].pubkey, "pk5");

        let saved = storage.get(VIEWER).unwrap();
        assert_eq!(saved, agg.view().history);
        assert!(!saved.profiles.iter().any(|p| p.pubkey == "pk0"));

        let mut reloaded = ProfileAggregator::new(ProfileConfig::default(), RecordingSink::default())
            .with_storage(storage);
        reloaded.set_viewer(Some(VIEWER));
        assert_eq!(reloaded.view().history.profiles[0].pubkey, "pk5");
    }

    #[test]
    fn test_viewer_login_after_selection_checks_following() {
        let sink = RecordingSink::default();
        let storage = MemoryHistoryStorage::new();
        let mut agg = ProfileAggregator::new(ProfileConfig::default(), sink.clone()).with_storage(storage.clone());
        agg.set_profile_key(Some(ALICE));
        assert_eq!(sink.count(), 4);

        // Logging in with an npub, then reselecting the profile being viewed
        let npub = nip19::hex_to_npub(VIEWER).unwrap();
        agg.set_viewer(Some(&npub));
        assert_eq!(agg.view().viewer.as_deref(), Some(VIEWER));
        agg.set_profile_key(Some(ALICE));
        assert_eq!(sink.count(), 9);

        let following = sink.last(CacheEndpoint::IsUserFollowing);
        assert_eq!(following.pubkey, ALICE);
        assert_eq!(following.user_pubkey.as_deref(), Some(VIEWER));
        event(&mut agg, &following.subscription, raw(IS_FOLLOWING, VIEWER, 1, "true"));
        assert!(agg.view().is_profile_following);

        let sub = sink.last(CacheEndpoint::UserProfile).subscription;
        event(&mut agg, &sub, metadata(ALICE, "fiatjaf"));
        assert_eq!(storage.get(VIEWER).unwrap().profiles[0].pubkey, ALICE);

        agg.set_viewer(None);
        assert!(agg.view().history.profiles.is_empty());
    }

    #[test]
    fn test_send_failure_clears_fetching() {
        let (mut agg, sink) = setup();
        sink.fail.set(true);
        agg.set_profile_key(Some(ALICE));

        assert!(!agg.view().is_fetching_any());
        assert_eq!(agg.pending_subscriptions(), 0);
        assert_eq!(agg.view().profile_key.as_deref(), Some(ALICE));
    }

    #[test]
    fn test_timeout_sweep() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let scored = sink.last(CacheEndpoint::ScoredContent).subscription;

        agg.sweep_timeouts_at(Instant::now() + Duration::from_secs(1));
        assert!(agg.view().is_fetching(SubscriptionPurpose::ScoredNotes));

        agg.sweep_timeouts_at(Instant::now() + Duration::from_secs(16));
        assert!(!agg.view().is_fetching_any());
        assert!(sink.closed.borrow().contains(&scored));

        event(&mut agg, &scored, text_note("late", 1));
        eose(&mut agg, &scored);
        assert!(agg.view().sidebar_notes.is_empty());
    }

    #[test]
    fn test_future_notes() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        agg.get_profile_mega_feed(Some(ALICE), FeedTab::Notes, 0, 20, 0);
        let feed = sink.last(CacheEndpoint::MegaFeed).subscription;
        agg.handle_message(RelayMessage::Events { sub_id: feed, events: vec![text_note("old", 100)] });

        agg.check_for_new_notes(Some(ALICE));
        let future = sink.last(CacheEndpoint::Feed);
        assert_eq!(future.since, Some(100));

        agg.handle_message(RelayMessage::Events {
            sub_id: future.subscription,
            events: vec![text_note("new", 150), text_note("old", 100)],
        });
        assert_eq!(agg.view().future.notes.len(), 1);
        assert_eq!(agg.view().notes.len(), 1);

        agg.load_future_content();
        let ids: Vec<_> = agg.view().notes.iter().map(|n| n.note_id.clone()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert!(agg.view().future.notes.is_empty());
    }

    #[test]
    fn test_reset_profile_keeps_key() {
        let (mut agg, sink) = setup();
        agg.set_profile_key(Some(ALICE));
        let sub = sink.last(CacheEndpoint::UserProfile).subscription;
        event(&mut agg, &sub, metadata(ALICE, "alice"));
        eose(&mut agg, &sub);

        agg.reset_profile();
        assert!(agg.view().user_profile.is_none());
        assert!(!agg.view().is_profile_fetched);
        assert_eq!(agg.view().profile_key.as_deref(), Some(ALICE));
    }
}
