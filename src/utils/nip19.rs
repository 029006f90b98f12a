use nostr_sdk::prelude::*;

/// Normalize a pubkey string to canonical hex format
/// Accepts npub, nprofile (with or without a `nostr:` prefix) and hex
pub fn normalize_pubkey(pubkey_str: &str) -> Result<String, String> {
    let identifier = pubkey_str.strip_prefix("nostr:").unwrap_or(pubkey_str);

    if identifier.starts_with("npub") || identifier.starts_with("nprofile") {
        match Nip19::from_bech32(identifier) {
            Ok(Nip19::Pubkey(pubkey)) => Ok(pubkey.to_hex()),
            Ok(Nip19::Profile(profile)) => Ok(profile.public_key.to_hex()),
            Ok(_) => Err("Not a profile identifier".to_string()),
            Err(e) => Err(format!("Failed to parse {}: {}", identifier, e)),
        }
    } else {
        match PublicKey::from_hex(identifier) {
            Ok(pubkey) => Ok(pubkey.to_hex()),
            Err(e) => Err(format!("Invalid pubkey format: {}", e)),
        }
    }
}

/// Encode a hex pubkey as `npub1...`
pub fn hex_to_npub(hex: &str) -> Option<String> {
    PublicKey::from_hex(hex).ok()?.to_bech32().ok()
}

/// Encode a hex event id as `note1...`
pub fn note_encode(hex: &str) -> Option<String> {
    EventId::from_hex(hex).ok()?.to_bech32().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const NPUB: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";

    #[test]
    fn test_hex_to_npub_round_trips_through_normalize() {
        let npub = hex_to_npub(HEX).unwrap();
        assert_eq!(npub, NPUB);
        assert_eq!(normalize_pubkey(&npub).unwrap(), HEX);
    }

    #[test]
    fn test_normalize_nprofile() {
        let pubkey = PublicKey::from_hex(HEX).unwrap();
        let nprofile = nostr_sdk::nips::nip19::Nip19Profile::new(pubkey, vec![]).to_bech32().unwrap();
        assert_eq!(normalize_pubkey(&nprofile).unwrap(), HEX);
        assert_eq!(normalize_pubkey(&format!("nostr:{}", nprofile)).unwrap(), HEX);
        assert_eq!(normalize_pubkey(&format!("nostr:{}", NPUB)).unwrap(), HEX);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(hex_to_npub("not-hex").is_none());
        assert!(note_encode("abcd").is_none());
        assert!(normalize_pubkey("npub1garbage").is_err());
    }

    #[test]
    fn test_note_encode_prefix() {
        let id = "b3e392b11f5d4f28321cedd09303a748acfd0487aea5a7450b3481c60b6e4f87";
        assert!(note_encode(id).unwrap().starts_with("note1"));
    }
}
