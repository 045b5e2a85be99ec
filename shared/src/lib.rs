use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub token_type: String,
}

/// Identity the server vouches for on `GET /api/auth/me`. Also the shape the
/// SPA persists under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorKind {
    Ip,
    Domain,
    Url,
    FileHash,
    Cve,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub threat_id: Uuid,
    pub ioc: String,
    pub kind: IndicatorKind,
    pub severity: Severity,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewThreat {
    pub ioc: String,
    pub kind: IndicatorKind,
    pub severity: Severity,
    pub source: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportThreatsRequest {
    pub threats: Vec<NewThreat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportThreatsResponse {
    pub imported: usize,
}

// Dashboard types

/// One KPI tile: the headline number plus a short delta caption
/// ("+12% from last week").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiValue {
    pub value: i64,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_iocs: KpiValue,
    pub new_feed_entries: KpiValue,
    pub critical_cves: KpiValue,
    pub phishing_domains: KpiValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentThreatsResponse {
    pub threats: Vec<Threat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub day: String,
    pub threats: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatTrendsResponse {
    pub points: Vec<TrendPoint>,
}

// Chat assistant types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: ChatSender,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
