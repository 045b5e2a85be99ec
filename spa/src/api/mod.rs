pub mod auth_api;
pub mod chat_api;
pub mod dashboard_api;
