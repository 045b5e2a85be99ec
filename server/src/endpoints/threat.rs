use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router};
use axum_macros::debug_handler;
use shared::{ImportThreatsRequest, ImportThreatsResponse};
use tracing::{info, warn};

use crate::AppContext;
use crate::auth::Claims;
use crate::db::threat;
use crate::error::{Error, Result};

pub fn router() -> Router {
    Router::new().route("/", post(import_threats))
}

pub fn feeds_router() -> Router {
    Router::new().route("/sync", post(sync_feeds))
}

#[debug_handler]
async fn import_threats(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
    Json(request): Json<ImportThreatsRequest>,
) -> Result<Json<ImportThreatsResponse>> {
    info!(
        user_id = %claims.user_id,
        count = request.threats.len(),
        "Indicator import received"
    );
    if request.threats.is_empty() {
        return Err(Error::unprocessable_entity([(
            "threats",
            "at least one indicator is required",
        )]));
    }
    let imported = threat::import_batch(&app_context.pool, &request.threats).await?;
    Ok(Json(ImportThreatsResponse { imported }))
}

/// Nudge the feed-sync daemon instead of waiting for its idle interval.
#[debug_handler]
async fn sync_feeds(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
) -> Result<StatusCode> {
    info!(user_id = %claims.user_id, "Manual feed sync requested");
    if app_context.tx_sync_feeds.send(()).is_err() {
        warn!("Feed sync daemon is not listening");
    }
    Ok(StatusCode::ACCEPTED)
}
