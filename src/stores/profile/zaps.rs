//! NIP-57 zap receipts received by a profile

use std::collections::HashMap;

use super::feed::FeedPage;
use super::kinds::ProfileEvent;
use super::types::{Article, Note, RawEvent, UserProfile, Zap};

/// One page of the zap list: receipts plus the notes and zappers they reference
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZapPage {
    pub receipts: Vec<RawEvent>,
    pub page: FeedPage,
}

/// A materialised zap page
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZapResults {
    pub zaps: Vec<Zap>,
    pub notes: Vec<Note>,
    pub articles: Vec<Article>,
    pub zappers: HashMap<String, UserProfile>,
}

impl ZapPage {
    pub fn absorb(&mut self, event: ProfileEvent) -> Option<ProfileEvent> {
        match event {
            ProfileEvent::Zap(receipt) => {
                self.receipts.push(receipt);
                None
            }
            other => self.page.absorb(other),
        }
    }

    pub fn into_results(self) -> ZapResults {
        ZapResults {
            zaps: self.receipts.iter().map(parse_zap_receipt).collect(),
            notes: self.page.to_notes(),
            articles: self.page.to_articles(),
            zappers: self.page.users,
        }
    }
}

/// Build a `Zap` from a kind 9735 receipt
///
/// The receipt's own pubkey belongs to the LNURL server; the zapper and the
/// message come from the zap request embedded in the `description` tag.
pub fn parse_zap_receipt(receipt: &RawEvent) -> Zap {
    let request = receipt
        .first_tag("description")
        .and_then(|d| serde_json::from_str::<serde_json::Value>(d).ok());

    let sender = receipt.first_tag("P").map(|s| s.to_string()).or_else(|| {
        request
            .as_ref()
            .and_then(|r| r.get("pubkey"))
            .and_then(|p| p.as_str())
            .map(|s| s.to_string())
    });

    let message = request
        .as_ref()
        .and_then(|r| r.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let amount = receipt
        .first_tag("bolt11")
        .and_then(parse_bolt11_amount)
        .or_else(|| request.as_ref().and_then(amount_from_request))
        .unwrap_or(0);

    Zap {
        id: receipt.id.clone().unwrap_or_default(),
        sender,
        receiver: receipt.first_tag("p").map(|s| s.to_string()),
        amount,
        message,
        created_at: receipt.created_at,
        zapped_event: receipt.first_tag("e").map(|s| s.to_string()),
    }
}

/// NIP-57: amount is in the request tags as ["amount", "millisats"]
fn amount_from_request(request: &serde_json::Value) -> Option<u64> {
    let tags = request.get("tags")?.as_array()?;
    tags.iter()
        .filter_map(|tag| tag.as_array())
        .find(|tag| tag.first().and_then(|v| v.as_str()) == Some("amount"))
        .and_then(|tag| tag.get(1))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u64>().ok())
        .map(|millisats| millisats / 1000)
}

/// Parse the amount in sats from a bolt11 invoice
fn parse_bolt11_amount(bolt11: &str) -> Option<u64> {
    // bolt11 format: ln[prefix][amount][multiplier]1[data]
    // The data part never contains '1', so the last one is the separator
    let lower = bolt11.to_lowercase();
    let hrp = &lower[..lower.rfind('1')?];

    let prefix_end = if hrp.starts_with("lnbcrt") {
        6
    } else if hrp.starts_with("lnbc") || hrp.starts_with("lntb") {
        4
    } else {
        return None;
    };

    let amount_part = &hrp[prefix_end..];
    let (digits, multiplier) = match amount_part.chars().last() {
        Some(c @ ('m' | 'u' | 'n' | 'p')) => (&amount_part[..amount_part.len() - 1], Some(c)),
        _ => (amount_part, None),
    };

    // Amountless invoice, or an hrp we don't understand
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let amount: u64 = digits.parse().ok()?;

    match multiplier {
        Some('m') => amount.checked_mul(100_000),
        Some('u') => amount.checked_mul(100),
        Some('n') => Some(amount / 10),
        Some('p') => Some(amount / 10_000),
        _ => amount.checked_mul(100_000_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::profile::kinds;

    fn receipt(tags: Vec<Vec<&str>>) -> RawEvent {
        RawEvent {
            id: Some("zap1".to_string()),
            kind: kinds::ZAP,
            pubkey: "lnurl-server".to_string(),
            created_at: 1234,
            tags: tags
                .into_iter()
                .map(|t| t.into_iter().map(String::from).collect())
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_bolt11_amount() {
        assert_eq!(parse_bolt11_amount("lnbc2500u1pvjluez"), Some(250_000));
        assert_eq!(parse_bolt11_amount("lnbc10n1abc"), Some(1));
        assert_eq!(parse_bolt11_amount("lnbc1m1abc"), Some(100_000));
        assert_eq!(parse_bolt11_amount("lnbcrt5u1abc"), Some(500));
        assert_eq!(parse_bolt11_amount("bitcoin:abc"), None);
        assert_eq!(parse_bolt11_amount("lnbc11pvjluez"), Some(100_000_000));
        assert_eq!(parse_bolt11_amount("lnbc1pvjluez"), None);
    }

    #[test]
    fn test_parse_bolt11_amount_overflow() {
        assert_eq!(parse_bolt11_amount("lnbc999999999999999"), None);
        assert_eq!(parse_bolt11_amount("lnbc999999999999999m1abc"), None);
        assert_eq!(parse_bolt11_amount("lnbc99999999999999999999u1abc"), None);
    }

    #[test]
    fn test_amountless_invoice_falls_back_to_request() {
        let zap = parse_zap_receipt(&receipt(vec![
            vec!["bolt11", "lnbc1pvjluez"],
            vec!["description", r#"{"pubkey":"zapper","tags":[["amount","5000"]]}"#],
        ]));
        assert_eq!(zap.amount, 5);
    }

    #[test]
    fn test_receipt_uses_request_for_sender_and_message() {
        let description = r#"{"pubkey":"zapper","content":"great post","tags":[["amount","21000"]]}"#;
        let zap = parse_zap_receipt(&receipt(vec![
            vec!["p", "receiver"],
            vec!["e", "note-id"],
            vec!["description", description],
        ]));

        assert_eq!(zap.sender.as_deref(), Some("zapper"));
        assert_eq!(zap.receiver.as_deref(), Some("receiver"));
        assert_eq!(zap.message, "great post");
        assert_eq!(zap.amount, 21);
        assert_eq!(zap.zapped_event.as_deref(), Some("note-id"));
        assert_eq!(zap.created_at, 1234);
    }

    #[test]
    fn test_receipt_prefers_bolt11_and_sender_tag() {
        let zap = parse_zap_receipt(&receipt(vec![
            vec!["P", "tagged-sender"],
            vec!["bolt11", "lnbc210n1xyz"],
            vec!["description", r#"{"pubkey":"other","tags":[["amount","99000"]]}"#],
        ]));
        assert_eq!(zap.sender.as_deref(), Some("tagged-sender"));
        assert_eq!(zap.amount, 21);
    }
}
