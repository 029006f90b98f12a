/// Profile Context
///
/// Reactive access to the profile aggregator. The aggregator lives in a global
/// signal; `ProfileProvider` restores the saved viewer and wires the aggregator
/// to the cache socket (listener registration follows the connection, frames
/// are fed in as they arrive, stale queries are swept). `ProfileContext`
/// exposes its actions.

use dioxus::prelude::*;
use tokio::sync::mpsc;

use crate::stores::profile::{
    FeedTab, LocalHistoryStorage, LogInstrumentation, ProfileAggregator, ProfileConfig, ProfileView,
    UserProfile,
};
use crate::stores::relay_socket::{self, SocketSink, SOCKET_CONNECTED};
use crate::stores::viewer_store;
use crate::utils::nip19;

const LISTENER_NAME: &str = "profile";
const SWEEP_INTERVAL_MS: u32 = 1_000;
const RECONNECT_INTERVAL_MS: u32 = 5_000;

/// The aggregator for the profile being viewed
pub static PROFILE: GlobalSignal<ProfileAggregator> = Signal::global(|| {
    ProfileAggregator::new(ProfileConfig::default(), SocketSink)
        .with_storage(LocalHistoryStorage)
        .with_instrumentation(LogInstrumentation)
});

/// Connects the profile aggregator to the cache socket for as long as it is mounted
#[component]
pub fn ProfileProvider(children: Element) -> Element {
    // Inbound frames: the socket pushes into `tx`, this task drains into the aggregator
    let tx = use_hook(|| {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        spawn(async move {
            while let Some(text) = rx.recv().await {
                PROFILE.write().handle_raw(&text);
            }
            log::debug!("Profile frame channel closed");
        });
        tx
    });

    // Register on connect, deregister on close; re-registering replaces the old entry
    use_effect(move || {
        if *SOCKET_CONNECTED.read() {
            relay_socket::add_listener(LISTENER_NAME, tx.clone());
        } else {
            relay_socket::remove_listener(LISTENER_NAME);
        }
    });

    use_hook(|| {
        // Restore the viewer before any profile is selected so its history loads
        if let Some(viewer) = viewer_store::load_viewer() {
            log::info!("Restoring viewer {}", viewer);
            PROFILE.write().set_viewer(Some(&viewer));
        }

        let url = PROFILE.peek().config().cache_url.clone();
        if let Err(e) = relay_socket::connect(&url) {
            log::error!("Failed to open cache socket: {}", e);
        }

        spawn(async move {
            let mut since_reconnect = 0;
            loop {
                gloo_timers::future::TimeoutFuture::new(SWEEP_INTERVAL_MS).await;

                if PROFILE.peek().pending_subscriptions() > 0 {
                    PROFILE.write().sweep_timeouts();
                }

                since_reconnect += SWEEP_INTERVAL_MS;
                if since_reconnect >= RECONNECT_INTERVAL_MS && relay_socket::needs_reconnect() {
                    since_reconnect = 0;
                    log::info!("Reconnecting cache socket");
                    if let Err(e) = relay_socket::connect(&url) {
                        log::error!("Failed to reopen cache socket: {}", e);
                    }
                }
            }
        });
    });

    use_drop(|| {
        relay_socket::remove_listener(LISTENER_NAME);
        relay_socket::disconnect();
    });

    rsx! {
        {children}
    }
}

/// Handle for reading the profile view and triggering its actions
#[derive(Clone, Copy, Debug, Default)]
pub struct ProfileContext;

pub fn use_profile_context() -> ProfileContext {
    ProfileContext
}

impl ProfileContext {
    /// Snapshot of the current view; reading subscribes the caller to changes
    pub fn view(&self) -> ProfileView {
        PROFILE.read().view().clone()
    }

    pub fn profile_key(&self) -> Option<String> {
        PROFILE.read().view().profile_key.clone()
    }

    // ============================================================================
    // Identity
    // ============================================================================

    /// Use `key` as the viewer and remember it; returns whether it was accepted
    pub fn login_viewer(&self, key: &str) -> bool {
        let viewer = match nip19::normalize_pubkey(key.trim()) {
            Ok(viewer) => viewer,
            Err(e) => {
                log::warn!("Not logging in: {}", e);
                return false;
            }
        };
        PROFILE.write().set_viewer(Some(&viewer));
        viewer_store::save_viewer(&viewer);
        true
    }

    pub fn logout_viewer(&self) {
        PROFILE.write().set_viewer(None);
        viewer_store::clear_viewer();
    }

    pub fn set_profile_key(&self, key: Option<&str>) {
        PROFILE.write().set_profile_key(key);
    }

    pub fn reset_profile(&self) {
        PROFILE.write().reset_profile();
    }

    // ============================================================================
    // Feeds
    // ============================================================================

    pub fn get_profile_mega_feed_next_page(&self, identity: Option<&str>, tab: FeedTab) {
        PROFILE.write().get_profile_mega_feed_next_page(identity, tab);
    }

    pub fn check_for_new_notes(&self, identity: Option<&str>) {
        PROFILE.write().check_for_new_notes(identity);
    }

    pub fn load_future_content(&self) {
        PROFILE.write().load_future_content();
    }

    pub fn clear_notes(&self) {
        PROFILE.write().clear_notes();
    }

    pub fn clear_replies(&self) {
        PROFILE.write().clear_replies();
    }

    pub fn clear_articles(&self) {
        PROFILE.write().clear_articles();
    }

    pub fn clear_gallery(&self) {
        PROFILE.write().clear_gallery();
    }

    // ============================================================================
    // Zaps
    // ============================================================================

    pub fn fetch_zap_list(&self, identity: Option<&str>) {
        PROFILE.write().fetch_zap_list(identity, 0, 0);
    }

    pub fn fetch_next_zaps_page(&self) {
        PROFILE.write().fetch_next_zaps_page();
    }

    pub fn clear_zaps(&self) {
        PROFILE.write().clear_zaps();
    }

    // ============================================================================
    // Contacts, followers, relays
    // ============================================================================

    pub fn fetch_contact_list(&self, identity: Option<&str>, extended: bool) {
        PROFILE.write().fetch_contact_list(identity, extended);
    }

    pub fn fetch_follower_list(&self, identity: Option<&str>) {
        PROFILE.write().fetch_follower_list(identity);
    }

    pub fn fetch_relay_list(&self, identity: Option<&str>) {
        PROFILE.write().fetch_relay_list(identity);
    }

    pub fn add_contact(&self, pubkey: &str, source: &[UserProfile]) {
        PROFILE.write().add_contact(pubkey, source);
    }

    pub fn remove_contact(&self, pubkey: &str) {
        PROFILE.write().remove_contact(pubkey);
    }

    pub fn clear_contacts(&self) {
        PROFILE.write().clear_contacts();
    }

    pub fn clear_filter_reason(&self) {
        PROFILE.write().clear_filter_reason();
    }
}
