/// Truncates a pubkey/npub string to show first 8 and last 8 chars
/// Returns "npub1abc...wxyz5678" format for long strings
pub fn truncate_pubkey(pubkey: &str) -> String {
    if pubkey.len() <= 19 || !pubkey.is_ascii() {
        return pubkey.to_string();
    }
    format!("{}...{}", &pubkey[..8], &pubkey[pubkey.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_pubkey() {
        assert_eq!(truncate_pubkey("short"), "short");
        assert_eq!(
            truncate_pubkey("npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6"),
            "npub180c...wsyjh6w6"
        );
    }
}
