use gloo_net::Error;
use gloo_net::http::Request;
use shared::{DashboardStats, RecentThreatsResponse, ThreatTrendsResponse};

async fn get_json<T: serde::de::DeserializeOwned>(endpoint: &str, token: &str) -> Result<T, Error> {
    let response = Request::get(endpoint)
        .header("Authorization", &format!("Bearer {token}"))
        .send()
        .await?;
    match response.status() {
        200 => Ok(response.json::<T>().await?),
        _ => {
            let response_body = response.text().await?;
            log::warn!(
                "Api get {endpoint}, error = unexpected response, status={status}, response={response_body}",
                status = response.status(),
            );
            Err(Error::GlooError("unexpected response".to_owned()))
        }
    }
}

pub async fn get_stats(token: &str) -> Result<DashboardStats, Error> {
    get_json("/api/dashboard/stats", token).await
}

pub async fn get_recent_threats(token: &str) -> Result<RecentThreatsResponse, Error> {
    get_json("/api/dashboard/threats/recent", token).await
}

pub async fn get_threat_trends(token: &str) -> Result<ThreatTrendsResponse, Error> {
    get_json("/api/dashboard/threats/trends", token).await
}
