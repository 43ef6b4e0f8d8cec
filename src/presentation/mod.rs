// Presentation layer - HTTP routes and dashboard rendering
pub mod app_state;
pub mod dashboard_view;
pub mod handlers;
pub mod router;
