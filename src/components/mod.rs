// UI Components

pub mod profile_page;

pub use profile_page::ProfilePage;
