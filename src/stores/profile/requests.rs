//! Outbound cache queries
//!
//! Requests are REQ frames addressed to a cache endpoint:
//! `["REQ", subId, {"cache": [endpoint, {params}]}]`.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::errors::{ProfileError, ProfileResult};
use super::types::FeedTab;

/// Cache endpoints used by the profile view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheEndpoint {
    UserProfile,
    ScoredContent,
    FollowedBy,
    MegaFeed,
    UserZaps,
    ContactList,
    UserFollowers,
    UserRelays,
    IsUserFollowing,
    Feed,
}

impl CacheEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserProfile => "user_profile",
            Self::ScoredContent => "user_profile_scored_content",
            Self::FollowedBy => "user_profile_followed_by",
            Self::MegaFeed => "mega_feed_directive",
            Self::UserZaps => "user_zaps_sorted",
            Self::ContactList => "contact_list",
            Self::UserFollowers => "user_followers",
            Self::UserRelays => "get_user_relays",
            Self::IsUserFollowing => "is_user_following",
            Self::Feed => "feed",
        }
    }
}

/// Mega feed selector, sent JSON-encoded in the `spec` param
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MegaFeedSpec {
    pub id: &'static str,
    pub kind: &'static str,
    pub notes: &'static str,
    pub pubkey: String,
}

impl MegaFeedSpec {
    pub fn for_tab(tab: FeedTab, pubkey: &str) -> Self {
        let (kind, notes) = match tab {
            FeedTab::Notes => ("notes", "authored"),
            FeedTab::Replies => ("notes", "replies"),
            FeedTab::Reads => ("reads", "authored"),
            FeedTab::Media => ("notes", "user_media_thumbnails"),
        };
        Self {
            id: "feed",
            kind,
            notes,
            pubkey: pubkey.to_string(),
        }
    }
}

/// One query against the cache
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileRequest {
    pub subscription: String,
    pub endpoint: CacheEndpoint,
    pub pubkey: String,
    /// The viewer, when known; lets the cache annotate note actions
    pub user_pubkey: Option<String>,
    pub limit: Option<u32>,
    pub until: Option<u64>,
    pub since: Option<u64>,
    pub offset: Option<u64>,
    pub spec: Option<MegaFeedSpec>,
    pub extended_response: Option<bool>,
}

impl ProfileRequest {
    pub fn new(subscription: String, endpoint: CacheEndpoint, pubkey: &str) -> Self {
        Self {
            subscription,
            endpoint,
            pubkey: pubkey.to_string(),
            user_pubkey: None,
            limit: None,
            until: None,
            since: None,
            offset: None,
            spec: None,
            extended_response: None,
        }
    }

    pub fn viewer(mut self, viewer: Option<&str>) -> Self {
        self.user_pubkey = viewer.map(|v| v.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Zero means "no bound" and is omitted
    pub fn until(mut self, until: u64) -> Self {
        self.until = (until > 0).then_some(until);
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = (offset > 0).then_some(offset);
        self
    }

    pub fn spec(mut self, spec: MegaFeedSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn extended(mut self, extended: bool) -> Self {
        self.extended_response = Some(extended);
        self
    }

    fn params(&self) -> ProfileResult<Value> {
        let mut params = Map::new();

        // The mega feed addresses the profile through its spec
        if self.spec.is_none() {
            params.insert("pubkey".to_string(), json!(self.pubkey));
        }
        if let Some(user_pubkey) = &self.user_pubkey {
            params.insert("user_pubkey".to_string(), json!(user_pubkey));
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), json!(limit));
        }
        if let Some(until) = self.until {
            params.insert("until".to_string(), json!(until));
        }
        if let Some(since) = self.since {
            params.insert("since".to_string(), json!(since));
        }
        if let Some(offset) = self.offset {
            params.insert("offset".to_string(), json!(offset));
        }
        if let Some(spec) = &self.spec {
            let encoded = serde_json::to_string(spec).map_err(|e| ProfileError::Encode(e.to_string()))?;
            params.insert("spec".to_string(), json!(encoded));
        }
        if let Some(extended) = self.extended_response {
            params.insert("extended_response".to_string(), json!(extended));
        }

        Ok(Value::Object(params))
    }

    /// Encode as a REQ text frame
    pub fn to_frame(&self) -> ProfileResult<String> {
        let params = self.params()?;
        let frame = json!(["REQ", self.subscription, { "cache": [self.endpoint.as_str(), params] }]);
        serde_json::to_string(&frame).map_err(|e| ProfileError::Encode(e.to_string()))
    }
}

/// Where requests go; implemented by the socket and by test recorders
pub trait RequestSink {
    fn send_request(&self, request: &ProfileRequest) -> ProfileResult<()>;

    /// Tell the cache an abandoned subscription is no longer wanted
    fn close_subscription(&self, _sub_id: &str) -> ProfileResult<()> {
        Ok(())
    }
}

/// Encode a CLOSE text frame
pub fn close_frame(sub_id: &str) -> ProfileResult<String> {
    serde_json::to_string(&json!(["CLOSE", sub_id])).map_err(|e| ProfileError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_shape() {
        let frame = ProfileRequest::new("profile_info_1".to_string(), CacheEndpoint::UserProfile, "abc")
            .viewer(Some("me"))
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value[0], "REQ");
        assert_eq!(value[1], "profile_info_1");
        assert_eq!(value[2]["cache"][0], "user_profile");
        assert_eq!(value[2]["cache"][1]["pubkey"], "abc");
        assert_eq!(value[2]["cache"][1]["user_pubkey"], "me");
    }

    #[test]
    fn test_close_frame() {
        assert_eq!(close_frame("profile_zaps_3").unwrap(), r#"["CLOSE","profile_zaps_3"]"#);
    }

    #[test]
    fn test_mega_feed_spec_is_encoded() {
        let request = ProfileRequest::new("s".to_string(), CacheEndpoint::MegaFeed, "abc")
            .spec(MegaFeedSpec::for_tab(FeedTab::Media, "abc"))
            .limit(20)
            .until(0)
            .offset(1700);
        let value: Value = serde_json::from_str(&request.to_frame().unwrap()).unwrap();
        let params = &value[2]["cache"][1];

        assert!(params.get("pubkey").is_none());
        assert!(params.get("until").is_none());
        assert_eq!(params["limit"], 20);
        assert_eq!(params["offset"], 1700);

        let spec: Value = serde_json::from_str(params["spec"].as_str().unwrap()).unwrap();
        assert_eq!(spec["notes"], "user_media_thumbnails");
        assert_eq!(spec["kind"], "notes");
        assert_eq!(spec["pubkey"], "abc");
    }
}
