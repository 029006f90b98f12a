//! Profile aggregation error types
//!
//! None of these ever reach the caller of a profile action. They are produced
//! at the decoding and transport boundaries, logged, and the offending event or
//! request is dropped.

use std::fmt;

/// Profile aggregation error type
#[derive(Debug)]
pub enum ProfileError {
    // ==========================================================================
    // Decoding Errors
    // ==========================================================================
    /// Inbound frame is not a `[type, subId, payload]` array we understand
    MalformedMessage(String),
    /// Event content could not be parsed for its kind
    MalformedContent { kind: u32, reason: String },
    /// Event kind is outside the closed set this client handles
    UnsupportedKind(u32),
    InvalidPubkey(String),

    // ==========================================================================
    // Outbound Errors
    // ==========================================================================
    Encode(String),
    Transport(String),
    NotConnected,

    // ==========================================================================
    // Persistence Errors
    // ==========================================================================
    Storage(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMessage(msg) => write!(f, "Malformed relay message: {}", msg),
            Self::MalformedContent { kind, reason } => {
                write!(f, "Malformed content for kind {}: {}", kind, reason)
            }
            Self::UnsupportedKind(kind) => write!(f, "Unsupported event kind: {}", kind),
            Self::InvalidPubkey(msg) => write!(f, "Invalid pubkey: {}", msg),
            Self::Encode(msg) => write!(f, "Failed to encode request: {}", msg),
            Self::Transport(msg) => write!(f, "Socket send failed: {}", msg),
            Self::NotConnected => write!(f, "Socket not connected"),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

/// Result type alias for profile aggregation
pub type ProfileResult<T> = Result<T, ProfileError>;

impl ProfileError {
    pub(crate) fn content(kind: u32, err: impl fmt::Display) -> Self {
        Self::MalformedContent {
            kind,
            reason: err.to_string(),
        }
    }
}
