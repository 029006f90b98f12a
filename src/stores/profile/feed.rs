//! Feed page accumulation
//!
//! A `FeedPage` collects everything a single subscription delivers (notes,
//! the authors' metadata, engagement stats, embedded mentions, paging range)
//! and is converted into display notes or articles once the stream ends.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::kinds::{self, ProfileEvent};
use super::types::{
    Article, Note, NoteActions, NoteStats, PaginationInfo, RawEvent, Repost, UserProfile,
};
use crate::utils::article_meta;

/// Raw material for one page of a feed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedPage {
    pub messages: Vec<RawEvent>,
    pub users: HashMap<String, UserProfile>,
    pub post_stats: HashMap<String, NoteStats>,
    pub mentions: HashMap<String, RawEvent>,
    pub note_actions: HashMap<String, NoteActions>,
    pub paging: Option<PaginationInfo>,
}

impl FeedPage {
    /// Fold a decoded event into the page
    ///
    /// Returns the event back when it has no place in a feed page.
    pub fn absorb(&mut self, event: ProfileEvent) -> Option<ProfileEvent> {
        match event {
            ProfileEvent::Metadata(user) => {
                self.users.insert(user.pubkey.clone(), user);
            }
            ProfileEvent::Note(message) | ProfileEvent::Article(message) => {
                self.messages.push(message);
            }
            ProfileEvent::NoteStats(stats) => {
                self.post_stats.insert(stats.event_id.clone(), stats);
            }
            ProfileEvent::Mention(mention) => {
                if let Some(id) = mention.id.clone() {
                    self.mentions.insert(id, mention);
                }
            }
            ProfileEvent::NoteActions(actions) => {
                self.note_actions.insert(actions.event_id.clone(), actions);
            }
            ProfileEvent::FeedRange(paging) => {
                self.paging = Some(paging);
            }
            other => return Some(other),
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Convert text notes and reposts into display notes, in delivery order
    pub fn to_notes(&self) -> Vec<Note> {
        self.messages
            .iter()
            .filter_map(|message| match message.kind {
                kinds::TEXT => Some(self.note_from(message.clone(), None)),
                kinds::REPOST => {
                    let original = self.reposted_event(message)?;
                    let repost = Repost {
                        note: message.clone(),
                        user: self.users.get(&message.pubkey).cloned(),
                    };
                    Some(self.note_from(original, Some(repost)))
                }
                _ => None,
            })
            .collect()
    }

    /// Convert long-form events into display articles, in delivery order
    pub fn to_articles(&self) -> Vec<Article> {
        self.messages
            .iter()
            .filter(|message| message.kind == kinds::LONG_FORM)
            .map(|event| {
                let id = event.id.clone().unwrap_or_default();
                Article {
                    note_id: event.note_id().unwrap_or_default(),
                    pubkey: event.pubkey.clone(),
                    identifier: article_meta::get_identifier(event),
                    title: article_meta::get_title(event),
                    summary: article_meta::get_summary(event),
                    image: article_meta::get_image(event),
                    published: article_meta::get_published_at(event),
                    user: self.users.get(&event.pubkey).cloned(),
                    stats: self.post_stats.get(&id).cloned(),
                    event: event.clone(),
                    id,
                }
            })
            .collect()
    }

    fn note_from(&self, post: RawEvent, repost: Option<Repost>) -> Note {
        let id = post.id.clone().unwrap_or_default();
        Note {
            note_id: post.note_id().unwrap_or_default(),
            user: self.users.get(&post.pubkey).cloned(),
            stats: self.post_stats.get(&id).cloned(),
            actions: self.note_actions.get(&id).cloned(),
            post,
            repost,
        }
    }

    /// NIP-18: the reposted event is embedded as JSON content; otherwise it
    /// may have been delivered as a mention referenced by the `e` tag
    fn reposted_event(&self, repost: &RawEvent) -> Option<RawEvent> {
        if !repost.content.trim().is_empty() {
            match serde_json::from_str::<RawEvent>(&repost.content) {
                Ok(original) => return Some(original),
                Err(e) => log::debug!("Repost content is not an event: {}", e),
            }
        }

        repost
            .first_tag("e")
            .and_then(|id| self.mentions.get(id))
            .cloned()
    }
}

/// Order notes by engagement score, highest first; ties keep delivery order
pub fn sort_by_score(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    notes
}
