// Utility functions
// Helper functions for common operations

pub mod nip19;
pub mod content_parser;
pub mod article_meta;
pub mod format;

pub use format::truncate_pubkey;
pub use content_parser::{parse_content, ContentToken};
