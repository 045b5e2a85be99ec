use axum::routing::get;
use axum::{Extension, Router};
use axum_macros::debug_handler;

use crate::AppContext;
use crate::db;
use crate::error::Result;

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod threat;

/// Everything mounted under `/api`. Only sign-up and sign-in are reachable
/// without a bearer token; the `Claims` extractor gates the rest.
pub fn routers() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/dashboard", dashboard::router())
        .nest("/threats", threat::router())
        .nest("/feeds", threat::feeds_router())
        .merge(chat::router())
}

pub fn health_check() -> Router {
    Router::new().route("/health", get(health))
}

#[debug_handler]
async fn health(Extension(app_context): Extension<AppContext>) -> Result<&'static str> {
    db::run_health_check(&app_context.pool).await?;
    Ok("OK")
}
