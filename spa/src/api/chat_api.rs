use gloo_net::Error;
use gloo_net::http::Request;
use shared::{ChatRequest, ChatResponse};

pub async fn send_message(token: &str, request: &ChatRequest) -> Result<ChatResponse, Error> {
    const ENDPOINT: &str = "/api/chat";
    let request_body = serde_json::to_string(request).expect("Serialize should not fail");
    let response = Request::post(ENDPOINT)
        .header("Authorization", &format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(request_body)?
        .send()
        .await?;
    log::info!("Api chat message sent");
    match response.status() {
        200 => Ok(response.json::<ChatResponse>().await?),
        _ => {
            let response_body = response.text().await?;
            log::warn!(
                "Api chat, error = unexpected response, status={status}, response={response_body}",
                status = response.status(),
            );
            Err(Error::GlooError("unexpected response".to_owned()))
        }
    }
}
