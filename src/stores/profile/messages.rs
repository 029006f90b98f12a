//! Inbound frames from the caching service
//!
//! Frames are JSON arrays: `["EVENT", subId, event]`, `["EVENTS", subId,
//! [event, ...]]`, `["EOSE", subId]` or `["NOTICE", subId?, text]`.

use serde_json::Value;

use super::errors::{ProfileError, ProfileResult};
use super::types::RawEvent;

/// A parsed inbound frame
#[derive(Clone, Debug, PartialEq)]
pub enum RelayMessage {
    Event { sub_id: String, event: RawEvent },
    Events { sub_id: String, events: Vec<RawEvent> },
    Eose { sub_id: String },
    Notice(String),
}

impl RelayMessage {
    /// Parse a text frame
    pub fn from_json(text: &str) -> ProfileResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> ProfileResult<Self> {
        let Value::Array(mut parts) = value else {
            return Err(ProfileError::MalformedMessage("frame is not an array".to_string()));
        };

        if parts.is_empty() {
            return Err(ProfileError::MalformedMessage("empty frame".to_string()));
        }

        let message_type = match parts.remove(0) {
            Value::String(s) => s,
            other => {
                return Err(ProfileError::MalformedMessage(format!(
                    "message type is not a string: {}",
                    other
                )))
            }
        };

        if message_type == "NOTICE" {
            let text = parts
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .last()
                .unwrap_or_default();
            return Ok(RelayMessage::Notice(text));
        }

        let sub_id = match parts.first() {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Err(ProfileError::MalformedMessage(format!(
                    "{} without subscription id",
                    message_type
                )))
            }
        };
        let payload = parts.into_iter().nth(1);

        match message_type.as_str() {
            "EVENT" => {
                let payload = payload.ok_or_else(|| {
                    ProfileError::MalformedMessage("EVENT without payload".to_string())
                })?;
                let event: RawEvent = serde_json::from_value(payload)?;
                Ok(RelayMessage::Event { sub_id, event })
            }
            "EVENTS" => {
                let events: Vec<RawEvent> = match payload {
                    Some(payload) => serde_json::from_value(payload)?,
                    None => Vec::new(),
                };
                Ok(RelayMessage::Events { sub_id, events })
            }
            "EOSE" => Ok(RelayMessage::Eose { sub_id }),
            other => Err(ProfileError::MalformedMessage(format!(
                "unknown message type {}",
                other
            ))),
        }
    }

    pub fn sub_id(&self) -> Option<&str> {
        match self {
            RelayMessage::Event { sub_id, .. }
            | RelayMessage::Events { sub_id, .. }
            | RelayMessage::Eose { sub_id } => Some(sub_id),
            RelayMessage::Notice(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let msg = RelayMessage::from_json(
            r#"["EVENT","profile_info_1",{"kind":0,"pubkey":"ab","created_at":5,"content":"{}","tags":[]}]"#,
        )
        .unwrap();
        let RelayMessage::Event { sub_id, event } = msg else {
            panic!("expected EVENT");
        };
        assert_eq!(sub_id, "profile_info_1");
        assert_eq!(event.kind, 0);
        assert_eq!(event.created_at, 5);
        assert!(event.id.is_none());
    }

    #[test]
    fn test_parse_events_and_eose() {
        let msg = RelayMessage::from_json(
            r#"["EVENTS","s",[{"kind":1,"content":"a"},{"kind":1,"content":"b"}]]"#,
        )
        .unwrap();
        match msg {
            RelayMessage::Events { events, .. } => assert_eq!(events.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            RelayMessage::from_json(r#"["EOSE","s"]"#).unwrap(),
            RelayMessage::Eose { sub_id: "s".to_string() }
        );
    }

    #[test]
    fn test_parse_notice() {
        assert_eq!(
            RelayMessage::from_json(r#"["NOTICE","s","slow down"]"#).unwrap(),
            RelayMessage::Notice("slow down".to_string())
        );
    }

    #[test]
    fn test_rejects_bad_frames() {
        assert!(RelayMessage::from_json("{}").is_err());
        assert!(RelayMessage::from_json("[]").is_err());
        assert!(RelayMessage::from_json(r#"["EVENT","s"]"#).is_err());
        assert!(RelayMessage::from_json(r#"["OK","s",true]"#).is_err());
        assert!(RelayMessage::from_json("not json").is_err());
    }
}
