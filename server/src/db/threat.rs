use std::str::FromStr;

use chrono::{DateTime, Utc};
use deadpool_postgres::GenericClient;
use postgres_from_row::FromRow;
use shared::{IndicatorKind, NewThreat, Severity, Threat, TrendPoint};
use tracing::{debug, info};
use uuid::Uuid;

use super::PgPool;
use crate::error::Result;

/// How many indicators the recent-threats table shows.
pub const RECENT_LIMIT: i64 = 10;

#[derive(Debug, FromRow)]
struct ThreatRow {
    threat_id: Uuid,
    ioc: String,
    kind: String,
    severity: String,
    source: String,
    observed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ThreatRow> for Threat {
    type Error = anyhow::Error;

    fn try_from(row: ThreatRow) -> anyhow::Result<Self> {
        Ok(Threat {
            threat_id: row.threat_id,
            ioc: row.ioc,
            kind: IndicatorKind::from_str(&row.kind)?,
            severity: Severity::from_str(&row.severity)?,
            source: row.source,
            observed_at: row.observed_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct ThreatCounts {
    pub total: i64,
    pub total_week_ago: i64,
    pub new_last_24h: i64,
    pub critical_cves: i64,
    pub critical_cves_week_ago: i64,
    pub phishing_domains: i64,
    pub phishing_domains_week_ago: i64,
}

/// Insert an indicator, or refresh severity and last-observed time when the
/// same `(ioc, source)` pair shows up again in a feed.
pub async fn upsert(pool: &PgPool, new_threat: &NewThreat) -> Result<Threat> {
    const SQL: &str = r"INSERT INTO threat (ioc, kind, severity, source, observed_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (ioc, source) DO UPDATE SET
            severity = EXCLUDED.severity,
            observed_at = GREATEST(threat.observed_at, EXCLUDED.observed_at)
        RETURNING threat.*;";
    let client = pool.get().await?;
    let row = client
        .query_one(
            SQL,
            &[
                &new_threat.ioc,
                &new_threat.kind.as_ref(),
                &new_threat.severity.as_ref(),
                &new_threat.source,
                &new_threat.observed_at,
            ],
        )
        .await?;
    let threat = Threat::try_from(ThreatRow::try_from_row(&row)?)?;
    debug!(ioc = %threat.ioc, source = %threat.source, "Indicator upserted");
    Ok(threat)
}

pub async fn import_batch(pool: &PgPool, threats: &[NewThreat]) -> Result<usize> {
    let mut imported = 0;
    for new_threat in threats {
        upsert(pool, new_threat).await?;
        imported += 1;
    }
    info!(imported, "Indicator batch imported");
    Ok(imported)
}

pub async fn get_recent(pool: &PgPool, limit: i64) -> Result<Vec<Threat>> {
    const SQL: &str = r"SELECT * FROM threat ORDER BY observed_at DESC LIMIT $1;";
    let client = pool.get().await?;
    let rows = client.query(SQL, &[&limit]).await?;
    let threats = rows
        .iter()
        .map(|row| Threat::try_from(ThreatRow::try_from_row(row)?))
        .collect::<anyhow::Result<Vec<Threat>>>()?;
    Ok(threats)
}

pub async fn get_counts(pool: &PgPool) -> Result<ThreatCounts> {
    const SQL: &str = r"SELECT
        count(*) AS total,
        count(*) FILTER (WHERE created_at < now() - interval '7 days') AS total_week_ago,
        count(*) FILTER (WHERE created_at >= now() - interval '24 hours') AS new_last_24h,
        count(*) FILTER (WHERE kind = 'cve' AND severity = 'critical') AS critical_cves,
        count(*) FILTER (WHERE kind = 'cve' AND severity = 'critical'
            AND created_at < now() - interval '7 days') AS critical_cves_week_ago,
        count(*) FILTER (WHERE kind = 'domain'
            AND severity IN ('high', 'critical')) AS phishing_domains,
        count(*) FILTER (WHERE kind = 'domain'
            AND severity IN ('high', 'critical')
            AND created_at < now() - interval '7 days') AS phishing_domains_week_ago
        FROM threat;";
    let client = pool.get().await?;
    let row = client.query_one(SQL, &[]).await?;
    Ok(ThreatCounts::try_from_row(&row)?)
}

/// Daily indicator counts for the trailing week, zero-filled for days with
/// no observations.
pub async fn get_trends(pool: &PgPool) -> Result<Vec<TrendPoint>> {
    const SQL: &str = r"SELECT to_char(d.day, 'Dy') AS day, count(t.threat_id) AS threats
        FROM generate_series(
            date_trunc('day', now()) - interval '6 days',
            date_trunc('day', now()),
            interval '1 day') AS d(day)
        LEFT JOIN threat t ON date_trunc('day', t.observed_at) = d.day
        GROUP BY d.day
        ORDER BY d.day;";
    let client = pool.get().await?;
    let rows = client.query(SQL, &[]).await?;
    let points = rows
        .iter()
        .map(|row| TrendPoint {
            day: row.get("day"),
            threats: row.get("threats"),
        })
        .collect();
    Ok(points)
}
