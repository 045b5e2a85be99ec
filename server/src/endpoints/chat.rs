use axum::routing::post;
use axum::{Extension, Json, Router};
use axum_macros::debug_handler;
use shared::{ChatRequest, ChatResponse};
use tracing::{info, warn};

use crate::AppContext;
use crate::assistant;
use crate::auth::Claims;
use crate::db::threat;
use crate::error::{Error, Result};

/// How many recent indicators get inlined as model context per query.
const CONTEXT_INDICATORS: i64 = 20;

pub fn router() -> Router {
    Router::new().route("/chat", post(chat_query))
}

#[debug_handler]
async fn chat_query(
    claims: Claims,
    Extension(app_context): Extension<AppContext>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    info!(
        user_id = %claims.user_id,
        message = %request.message,
        "Chat query received"
    );

    if request.message.trim().is_empty() {
        return Err(Error::unprocessable_entity([(
            "message",
            "message must not be empty",
        )]));
    }

    let (ollama_url, text_model) = match (
        &app_context.config.ollama.ollama_url,
        &app_context.config.ollama.ollama_text_model,
    ) {
        (Some(url), Some(model)) => (url.clone(), model.clone()),
        _ => {
            warn!("Chat query attempted but Ollama is not configured");
            return Err(Error::bad_request([(
                "ollama",
                "AI features are not available. Ollama is not configured.",
            )]));
        }
    };

    let threats = threat::get_recent(&app_context.pool, CONTEXT_INDICATORS).await?;

    match assistant::respond(
        &ollama_url,
        &text_model,
        &threats,
        &request.history,
        &request.message,
    )
    .await
    {
        Ok(response) => {
            info!(
                user_id = %claims.user_id,
                context_indicators = threats.len(),
                "Chat query processed successfully"
            );
            Ok(Json(ChatResponse { response }))
        }
        Err(error) => {
            warn!(
                user_id = %claims.user_id,
                message = %request.message,
                ?error,
                "Chat query processing failed"
            );
            Err(Error::from(anyhow::anyhow!(
                "Failed to process chat query: {}",
                error
            )))
        }
    }
}
