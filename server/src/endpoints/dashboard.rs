use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_macros::debug_handler;
use shared::{DashboardStats, KpiValue, RecentThreatsResponse, ThreatTrendsResponse};
use tracing::{debug, info};

use crate::AppContext;
use crate::auth::Claims;
use crate::db::threat;
use crate::error::Result;

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/threats/recent", get(recent_threats))
        .route("/threats/trends", get(threat_trends))
}

fn change_caption(current: i64, week_ago: i64) -> String {
    let delta = current - week_ago;
    if week_ago == 0 {
        if delta == 0 {
            "no change this week".to_owned()
        } else {
            format!("+{delta} this week")
        }
    } else {
        let percent = (delta as f64 / week_ago as f64) * 100.0;
        format!("{percent:+.0}% from last week")
    }
}

#[debug_handler]
async fn stats(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
) -> Result<Json<DashboardStats>> {
    debug!(user_id = %claims.user_id, "Dashboard stats requested");
    let counts = threat::get_counts(&app_context.pool).await?;
    let stats = DashboardStats {
        total_iocs: KpiValue {
            value: counts.total,
            change: change_caption(counts.total, counts.total_week_ago),
        },
        new_feed_entries: KpiValue {
            value: counts.new_last_24h,
            change: "in the last 24 hours".to_owned(),
        },
        critical_cves: KpiValue {
            value: counts.critical_cves,
            change: change_caption(counts.critical_cves, counts.critical_cves_week_ago),
        },
        phishing_domains: KpiValue {
            value: counts.phishing_domains,
            change: change_caption(counts.phishing_domains, counts.phishing_domains_week_ago),
        },
    };
    Ok(Json(stats))
}

#[debug_handler]
async fn recent_threats(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
) -> Result<Json<RecentThreatsResponse>> {
    debug!(user_id = %claims.user_id, "Recent threats requested");
    let threats = threat::get_recent(&app_context.pool, threat::RECENT_LIMIT).await?;
    info!(
        user_id = %claims.user_id,
        count = threats.len(),
        "Recent threats retrieved"
    );
    Ok(Json(RecentThreatsResponse { threats }))
}

#[debug_handler]
async fn threat_trends(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
) -> Result<Json<ThreatTrendsResponse>> {
    debug!(user_id = %claims.user_id, "Threat trends requested");
    let points = threat::get_trends(&app_context.pool).await?;
    Ok(Json(ThreatTrendsResponse { points }))
}
