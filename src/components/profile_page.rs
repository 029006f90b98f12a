use dioxus::prelude::*;

use crate::context::{use_profile_context, ProfileContext};
use crate::stores::profile::{FeedTab, SubscriptionPurpose, UserProfile};
use crate::utils::{truncate_pubkey, ContentToken};

/// What the lower half of the page shows
#[derive(Clone, Copy, Debug, PartialEq)]
enum Panel {
    Feed(FeedTab),
    Zaps,
    Following,
    Followers,
    Relays,
}

impl Panel {
    const ALL: [Panel; 8] = [
        Panel::Feed(FeedTab::Notes),
        Panel::Feed(FeedTab::Replies),
        Panel::Feed(FeedTab::Reads),
        Panel::Feed(FeedTab::Media),
        Panel::Zaps,
        Panel::Following,
        Panel::Followers,
        Panel::Relays,
    ];

    fn label(&self) -> &'static str {
        match self {
            Panel::Feed(tab) => tab.as_str(),
            Panel::Zaps => "zaps",
            Panel::Following => "following",
            Panel::Followers => "followers",
            Panel::Relays => "relays",
        }
    }

    fn purpose(&self) -> SubscriptionPurpose {
        match self {
            Panel::Feed(tab) => SubscriptionPurpose::Feed(*tab),
            Panel::Zaps => SubscriptionPurpose::Zaps,
            Panel::Following => SubscriptionPurpose::Contacts,
            Panel::Followers => SubscriptionPurpose::Followers,
            Panel::Relays => SubscriptionPurpose::Relays,
        }
    }
}

/// Fetch the panel's first page if it has nothing yet, or start over on `refresh`
fn load_panel(profile: ProfileContext, panel: Panel, refresh: bool) {
    let view = profile.view();
    let Some(key) = view.profile_key.as_deref() else {
        return;
    };
    if view.is_fetching(panel.purpose()) {
        return;
    }

    let has_data = match panel {
        Panel::Feed(FeedTab::Reads) => !view.articles.is_empty(),
        Panel::Feed(tab) => !view.feed(tab).is_empty(),
        Panel::Zaps => !view.zaps.is_empty(),
        Panel::Following => !view.contacts.is_empty(),
        Panel::Followers => !view.followers.is_empty(),
        Panel::Relays => !view.relays.is_empty(),
    };
    if has_data && !refresh {
        return;
    }

    if refresh {
        match panel {
            Panel::Feed(FeedTab::Notes) => profile.clear_notes(),
            Panel::Feed(FeedTab::Replies) => profile.clear_replies(),
            Panel::Feed(FeedTab::Reads) => profile.clear_articles(),
            Panel::Feed(FeedTab::Media) => profile.clear_gallery(),
            Panel::Zaps => profile.clear_zaps(),
            Panel::Following | Panel::Followers => profile.clear_contacts(),
            Panel::Relays => {}
        }
    }

    match panel {
        Panel::Feed(tab) => profile.get_profile_mega_feed_next_page(Some(key), tab),
        Panel::Zaps => profile.fetch_zap_list(Some(key)),
        Panel::Following => profile.fetch_contact_list(Some(key), true),
        Panel::Followers => profile.fetch_follower_list(Some(key)),
        Panel::Relays => profile.fetch_relay_list(Some(key)),
    }
}

fn select_profile(profile: ProfileContext, key: &str, panel: Panel) {
    profile.set_profile_key(Some(key));
    load_panel(profile, panel, false);
}

/// Profile lookup page: viewer login, key input, header and the content panels
#[component]
pub fn ProfilePage() -> Element {
    let profile = use_profile_context();
    let mut key_input = use_signal(String::new);
    let mut viewer_input = use_signal(String::new);
    let mut panel = use_signal(|| Panel::Feed(FeedTab::Notes));

    // Leave no stale profile behind for the next mount
    use_drop(move || profile.reset_profile());

    let view = profile.view();
    let active = *panel.read();
    let key = view.profile_key.clone();

    let display_name = view
        .user_profile
        .as_ref()
        .map(|p| p.get_display_name())
        .or_else(|| key.as_deref().map(truncate_pubkey))
        .unwrap_or_default();

    let recent: Vec<(String, String)> = view
        .history
        .profiles
        .iter()
        .map(|p| (p.pubkey.clone(), p.get_display_name()))
        .collect();

    let common: Vec<(String, String, Vec<UserProfile>)> = view
        .common_followers
        .iter()
        .map(|p| (p.pubkey.clone(), p.get_display_name(), view.common_followers.clone()))
        .collect();

    rsx! {
        div {
            class: "min-h-screen max-w-2xl mx-auto",

            // Viewer
            div {
                class: "px-4 py-2 flex items-center gap-2 text-sm border-b border-border",
                if let Some(viewer) = view.viewer.as_deref() {
                    span { class: "flex-1 text-muted-foreground", "Signed in as {truncate_pubkey(viewer)}" }
                    button {
                        class: "px-3 py-1 rounded-lg hover:bg-accent",
                        onclick: move |_| profile.logout_viewer(),
                        "Log out"
                    }
                } else {
                    input {
                        class: "flex-1 px-3 py-1 rounded-lg border border-border bg-background",
                        placeholder: "Your npub (read-only login)",
                        value: "{viewer_input}",
                        oninput: move |evt| viewer_input.set(evt.value()),
                    }
                    button {
                        class: "px-3 py-1 rounded-lg bg-primary text-primary-foreground",
                        onclick: move |_| {
                            let value = viewer_input.read().trim().to_string();
                            if value.is_empty() || !profile.login_viewer(&value) {
                                return;
                            }
                            viewer_input.set(String::new());
                            // Reselect so the follow check and note actions use the viewer
                            if let Some(current) = profile.profile_key() {
                                select_profile(profile, &current, *panel.peek());
                            }
                        },
                        "Log in"
                    }
                }
            }

            // Key input
            form {
                class: "p-4 flex gap-2 border-b border-border",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    let value = key_input.read().trim().to_string();
                    if value.is_empty() {
                        profile.set_profile_key(None);
                    } else {
                        select_profile(profile, &value, *panel.peek());
                    }
                },
                input {
                    class: "flex-1 px-3 py-2 rounded-lg border border-border bg-background",
                    placeholder: "npub1… or hex public key",
                    value: "{key_input}",
                    oninput: move |evt| key_input.set(evt.value()),
                }
                button {
                    class: "px-4 py-2 rounded-lg bg-primary text-primary-foreground",
                    r#type: "submit",
                    "View"
                }
            }

            // Recently viewed
            if !recent.is_empty() {
                div {
                    class: "px-4 py-2 flex flex-wrap gap-2 border-b border-border",
                    for (pubkey, name) in recent {
                        button {
                            key: "{pubkey}",
                            class: "px-2 py-1 text-xs rounded-full bg-accent",
                            onclick: move |_| select_profile(profile, &pubkey, *panel.peek()),
                            "{name}"
                        }
                    }
                }
            }

            if key.is_some() {
                // Header
                div {
                    class: "p-4 border-b border-border",
                    if let Some(reason) = view.filter_reason.as_ref() {
                        div {
                            class: "mb-3 p-3 rounded-lg bg-destructive/10 text-destructive text-sm flex items-center gap-2",
                            span {
                                class: "flex-1",
                                "This profile is filtered"
                                if let Some(group) = reason.group.as_ref() {
                                    " ({group})"
                                }
                            }
                            button {
                                class: "underline",
                                onclick: move |_| profile.clear_filter_reason(),
                                "Show anyway"
                            }
                        }
                    }
                    if let Some(picture) = view.user_profile.as_ref().and_then(|p| p.picture.clone()) {
                        img {
                            class: "w-20 h-20 rounded-full object-cover mb-3",
                            src: "{picture}",
                        }
                    }
                    h2 {
                        class: "text-xl font-bold",
                        "{display_name}"
                    }
                    if !view.is_profile_fetched && view.is_fetching_any() {
                        p {
                            class: "text-sm text-muted-foreground",
                            "Loading profile…"
                        }
                    }
                    if view.is_profile_following {
                        span {
                            class: "text-xs text-muted-foreground",
                            "Follows you"
                        }
                    }
                    if view.is_about_parsed {
                        p {
                            class: "mt-2 whitespace-pre-wrap break-words",
                            for (i, token) in view.parsed_about.iter().enumerate() {
                                match token {
                                    ContentToken::Text(text) => rsx! { span { key: "{i}", "{text}" } },
                                    ContentToken::Link(url) => rsx! {
                                        a { key: "{i}", class: "text-primary hover:underline", href: "{url}", target: "_blank", "{url}" }
                                    },
                                    ContentToken::Hashtag(tag) => rsx! { span { key: "{i}", class: "text-primary", "#{tag}" } },
                                    ContentToken::Mention(mention) | ContentToken::EventMention(mention) => rsx! {
                                        span { key: "{i}", class: "text-primary", "{truncate_pubkey(mention)}" }
                                    },
                                }
                            }
                        }
                    }
                    if view.fetched_user_stats {
                        div {
                            class: "mt-3 flex gap-4 text-sm text-muted-foreground",
                            span { "{view.user_stats.follows_count} following" }
                            span { "{view.user_stats.followers_count} followers" }
                            span { "{view.user_stats.note_count} notes" }
                            span { "{view.user_stats.total_satszapped} sats" }
                        }
                    }
                    if !common.is_empty() {
                        div {
                            class: "mt-2 flex flex-wrap items-center gap-2 text-xs text-muted-foreground",
                            "Followed by"
                            for (pubkey, name, source) in common {
                                span {
                                    key: "{pubkey}",
                                    class: "flex items-center gap-1",
                                    "{name}"
                                    button {
                                        class: "text-primary",
                                        title: "Add to following",
                                        onclick: move |_| profile.add_contact(&pubkey, &source),
                                        "+"
                                    }
                                }
                            }
                        }
                    }
                }

                // New notes banner
                if !view.future.notes.is_empty() {
                    button {
                        class: "w-full py-2 text-sm text-primary hover:bg-accent",
                        onclick: move |_| profile.load_future_content(),
                        "Show {view.future.notes.len()} new notes"
                    }
                }

                // Panel selector
                div {
                    class: "flex overflow-x-auto border-b border-border",
                    for p in Panel::ALL {
                        button {
                            key: "{p.label()}",
                            class: if p == active { "flex-1 px-3 py-3 font-semibold border-b-2 border-primary" } else { "flex-1 px-3 py-3 text-muted-foreground hover:bg-accent" },
                            onclick: move |_| {
                                panel.set(p);
                                load_panel(profile, p, false);
                            },
                            "{p.label()}"
                        }
                    }
                }

                div {
                    class: "flex justify-end gap-2 px-4 py-2 text-xs",
                    if active == Panel::Feed(FeedTab::Notes) {
                        button {
                            class: "text-primary hover:underline",
                            onclick: move |_| {
                                let key = profile.profile_key();
                                profile.check_for_new_notes(key.as_deref());
                            },
                            "Check for new notes"
                        }
                    }
                    button {
                        class: "text-primary hover:underline",
                        onclick: move |_| load_panel(profile, active, true),
                        "Refresh"
                    }
                }

                // Panel content
                div {
                    class: "divide-y divide-border",
                    match active {
                        Panel::Feed(FeedTab::Reads) => rsx! {
                            for article in view.articles.iter() {
                                div {
                                    key: "{article.id}",
                                    class: "p-4",
                                    h3 { class: "font-semibold", "{article.title}" }
                                    if let Some(summary) = article.summary.as_ref() {
                                        p { class: "text-sm text-muted-foreground", "{summary}" }
                                    }
                                }
                            }
                        },
                        Panel::Feed(tab) => rsx! {
                            for note in view.feed(tab).iter() {
                                div {
                                    key: "{note.note_id}",
                                    class: "p-4 whitespace-pre-wrap break-words",
                                    if note.repost.is_some() {
                                        div { class: "text-xs text-muted-foreground mb-1", "Reposted" }
                                    }
                                    "{note.post.content}"
                                }
                            }
                        },
                        Panel::Zaps => rsx! {
                            for zap in view.zaps.iter() {
                                div {
                                    key: "{zap.id}",
                                    class: "p-4 text-sm",
                                    span {
                                        class: "font-semibold",
                                        {
                                            zap.sender
                                                .as_ref()
                                                .map(|s| {
                                                    view.zappers
                                                        .get(s)
                                                        .map(|p| p.get_display_name())
                                                        .unwrap_or_else(|| truncate_pubkey(s))
                                                })
                                                .unwrap_or_else(|| "Anonymous".to_string())
                                        }
                                    }
                                    " zapped {zap.amount} sats"
                                    if !zap.message.is_empty() {
                                        p { class: "text-muted-foreground", "{zap.message}" }
                                    }
                                }
                            }
                        },
                        Panel::Following => rsx! {
                            p {
                                class: "px-4 py-2 text-xs text-muted-foreground",
                                "{view.following.len()} in contact list"
                            }
                            for (pubkey, name) in view.contacts.iter().map(|c| (c.pubkey.clone(), c.get_display_name())) {
                                div {
                                    key: "{pubkey}",
                                    class: "p-4 flex items-center text-sm",
                                    span { class: "flex-1", "{name}" }
                                    button {
                                        class: "text-xs text-muted-foreground hover:underline",
                                        onclick: move |_| profile.remove_contact(&pubkey),
                                        "Remove"
                                    }
                                }
                            }
                        },
                        Panel::Followers => rsx! {
                            for follower in view.followers.iter() {
                                div {
                                    key: "{follower.pubkey}",
                                    class: "p-4 text-sm",
                                    "{follower.get_display_name()}"
                                }
                            }
                        },
                        Panel::Relays => rsx! {
                            for (url, config) in view.relays.iter() {
                                div {
                                    key: "{url}",
                                    class: "p-4 flex text-sm",
                                    span { class: "flex-1 break-all", "{url}" }
                                    if config.read {
                                        span { class: "ml-2 text-xs text-muted-foreground", "read" }
                                    }
                                    if config.write {
                                        span { class: "ml-2 text-xs text-muted-foreground", "write" }
                                    }
                                }
                            }
                        },
                    }
                }

                if view.is_fetching(active.purpose()) {
                    div {
                        class: "p-4 text-center text-muted-foreground",
                        "Loading…"
                    }
                } else {
                    match active {
                        Panel::Feed(tab) => rsx! {
                            button {
                                class: "w-full py-3 text-sm text-primary hover:bg-accent",
                                onclick: move |_| {
                                    let key = profile.profile_key();
                                    profile.get_profile_mega_feed_next_page(key.as_deref(), tab);
                                },
                                "Load more"
                            }
                        },
                        Panel::Zaps => rsx! {
                            button {
                                class: "w-full py-3 text-sm text-primary hover:bg-accent",
                                onclick: move |_| profile.fetch_next_zaps_page(),
                                "Load more"
                            }
                        },
                        _ => rsx! {},
                    }
                }
            }
        }
    }
}
