// Profile aggregation
// Per-profile view state fed by the caching service

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod feed;
pub mod history;
pub mod instrumentation;
pub mod kinds;
pub mod messages;
pub mod requests;
pub mod state;
pub mod storage;
pub mod subscriptions;
pub mod types;
pub mod zaps;

pub use aggregator::ProfileAggregator;
pub use config::ProfileConfig;
pub use errors::{ProfileError, ProfileResult};
pub use instrumentation::LogInstrumentation;
pub use requests::{ProfileRequest, RequestSink};
pub use state::ProfileView;
pub use storage::LocalHistoryStorage;
pub use subscriptions::SubscriptionPurpose;
pub use types::{FeedTab, UserProfile};
