// Presentation layer - HTTP surface over the profile service
pub mod api_error;
pub mod app_state;
pub mod handlers;
