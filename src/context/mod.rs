pub mod profile_context;

pub use profile_context::{use_profile_context, ProfileContext, ProfileProvider};
