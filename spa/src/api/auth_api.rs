use async_trait::async_trait;
use gloo_net::Error;
use gloo_net::http::Request;
use shared::{MeResponse, SessionUser, SignInResponse};

use crate::session::{ApiError, AuthApi};

pub async fn sign_in(username: &str, password: &str) -> Result<SignInResponse, Error> {
    const ENDPOINT: &str = "/api/auth/sign-in";
    let request_body = serde_json::json!({
        "username": username,
        "password": password,
    })
    .to_string();
    let response = Request::post(ENDPOINT)
        .header("Content-Type", "application/json")
        .body(request_body)?
        .send()
        .await?;
    log::info!("Api sign-in, username={username}");
    match response.status() {
        200 => {
            let sign_in = response.json::<SignInResponse>().await?;
            Ok(sign_in)
        }
        401 => Err(Error::GlooError("wrong credentials".to_owned())),
        _ => {
            let response_body = response.text().await?;
            log::warn!(
                "Api sign-in, error = unexpected response, status={status}, response={response_body}",
                status = response.status(),
            );
            Err(Error::GlooError("unexpected response".to_owned()))
        }
    }
}

/// The live `AuthApi` used by the session controller in the browser.
pub struct HttpAuthApi;

#[async_trait(?Send)]
impl AuthApi for HttpAuthApi {
    async fn fetch_me(&self, token: &str) -> Result<SessionUser, ApiError> {
        const ENDPOINT: &str = "/api/auth/me";
        let response = Request::get(ENDPOINT)
            .header("Authorization", &format!("Bearer {token}"))
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        match response.status() {
            200 => {
                let me = response
                    .json::<MeResponse>()
                    .await
                    .map_err(|error| ApiError::Transport(error.to_string()))?;
                Ok(me.user)
            }
            status => {
                log::warn!("Api get me rejected, status={status}");
                Err(ApiError::Rejected)
            }
        }
    }

    async fn notify_logout(&self, token: &str) -> Result<(), ApiError> {
        const ENDPOINT: &str = "/api/auth/logout";
        let response = Request::post(ENDPOINT)
            .header("Authorization", &format!("Bearer {token}"))
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        if response.ok() {
            Ok(())
        } else {
            Err(ApiError::Rejected)
        }
    }
}
