use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{IndicatorKind, NewThreat, Severity};
use url::Url;

use super::DAEMON_IDLE_SLEEP;
use crate::db::PgPool;
use crate::db::threat;

/// One entry of the upstream feed document: a JSON array of indicators.
/// The source label comes from configuration, not from the feed itself.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub ioc: String,
    pub kind: IndicatorKind,
    pub severity: Severity,
    pub observed_at: DateTime<Utc>,
}

pub async fn run(
    pool: &PgPool,
    feed_url: &Url,
    feed_source: &str,
    mut sync_rx: tokio::sync::watch::Receiver<()>,
) -> Result<()> {
    let http = reqwest::Client::new();
    let mut interval = tokio::time::interval(DAEMON_IDLE_SLEEP);
    loop {
        match execute_step(pool, &http, feed_url, feed_source).await {
            Ok(imported) => {
                tracing::info!(imported, "Feed sync round complete");
            }
            Err(error) => {
                // Feed outages are expected; the next round retries.
                tracing::error!(?error, "Feed sync round failed");
            }
        }

        tokio::select! {
            _ = sync_rx.changed() => {
                tracing::info!("Sync notification received, fetching feed...");
                // Reset interval to avoid immediate timeout after notification
                interval.reset();
            }
            _ = interval.tick() => {
                tracing::info!("{DAEMON_IDLE_SLEEP:?} passed, fetching feed...");
            }
        }
    }
}

async fn execute_step(
    pool: &PgPool,
    http: &reqwest::Client,
    feed_url: &Url,
    feed_source: &str,
) -> Result<usize> {
    let response = http
        .get(feed_url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch threat feed from {feed_url}"))?
        .error_for_status()
        .with_context(|| format!("Threat feed at {feed_url} answered with an error status"))?;

    let entries: Vec<FeedEntry> = response
        .json()
        .await
        .with_context(|| format!("Failed to parse threat feed from {feed_url}"))?;

    if entries.is_empty() {
        tracing::info!("Feed is empty, nothing to import");
        return Ok(0);
    }

    let threats: Vec<NewThreat> = entries
        .into_iter()
        .map(|entry| NewThreat {
            ioc: entry.ioc,
            kind: entry.kind,
            severity: entry.severity,
            source: feed_source.to_owned(),
            observed_at: entry.observed_at,
        })
        .collect();

    let imported = threat::import_batch(pool, &threats)
        .await
        .context("Failed to store feed indicators")?;
    Ok(imported)
}
