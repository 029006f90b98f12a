// Global state management
// Stores provide shared state across the application

pub mod profile;
pub mod relay_metadata;
pub mod relay_socket;
pub mod viewer_store;
