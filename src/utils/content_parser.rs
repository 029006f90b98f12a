use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid url pattern"));
static NOSTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"nostr:(npub1|note1|nevent1|nprofile1|naddr1)[a-zA-Z0-9]+")
        .expect("valid nostr uri pattern")
});
static HASHTAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\w+)").expect("valid hashtag pattern"));

/// Characters that end a sentence rather than a URL
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Tokens of a profile bio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentToken {
    Text(String),
    Link(String),
    Mention(String),      // npub/nprofile
    EventMention(String), // note/nevent/naddr
    Hashtag(String),
}

/// Parse bio text into structured tokens
///
/// Empty input yields no tokens.
pub fn parse_content(content: &str) -> Vec<ContentToken> {
    let mut tokens = Vec::new();
    let mut matches: Vec<(usize, usize, ContentToken)> = Vec::new();

    for mat in URL_PATTERN.find_iter(content) {
        let url = mat.as_str().trim_end_matches(URL_TRAILING);
        matches.push((mat.start(), mat.start() + url.len(), ContentToken::Link(url.to_string())));
    }

    for mat in NOSTR_PATTERN.find_iter(content) {
        let uri = mat.as_str();
        let bech32 = uri.trim_start_matches("nostr:").to_string();
        let token = if bech32.starts_with("npub1") || bech32.starts_with("nprofile1") {
            ContentToken::Mention(bech32)
        } else {
            ContentToken::EventMention(bech32)
        };
        matches.push((mat.start(), mat.end(), token));
    }

    for mat in HASHTAG_PATTERN.find_iter(content) {
        let hashtag = mat.as_str()[1..].to_string();
        matches.push((mat.start(), mat.end(), ContentToken::Hashtag(hashtag)));
    }

    matches.sort_by_key(|m| m.0);

    let mut last_end = 0;
    for (start, end, token) in matches {
        // Overlapping match, e.g. a #fragment inside a URL
        if start < last_end {
            continue;
        }

        if start > last_end {
            tokens.push(ContentToken::Text(content[last_end..start].to_string()));
        }

        tokens.push(token);
        last_end = end;
    }

    if last_end < content.len() {
        tokens.push(ContentToken::Text(content[last_end..].to_string()));
    }

    tokens
}
