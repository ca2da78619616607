//! HTTP request handlers.

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use super::server::{AppState, RequestId};
use super::types::{ChatReply, ChatRequest, EMPTY_MESSAGE_REPLY};
use crate::config::ErrorMode;
use crate::error::{Error, Result};
use crate::upstream::{ContentGenerator, ReplySource};

/// Send `prompt` upstream and extract the reply text.
///
/// Exactly one upstream call per invocation. A response without usable text
/// yields [`crate::upstream::NO_REPLY`], not an error.
pub async fn relay_message(generator: &dyn ContentGenerator, prompt: &str) -> Result<String> {
    let response = generator.generate_content(prompt).await?;
    Ok(ReplySource::from(response).into_reply())
}

/// Handle POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::BytesRejection(rejection)) => {
            tracing::warn!(
                request_id = %request_id,
                status = %rejection.status(),
                rejection = %rejection.body_text(),
                "Failed to read chat request body"
            );
            return Err(Error::Body {
                status: rejection.status(),
                message: rejection.body_text(),
            });
        }
        Err(rejection) => {
            tracing::debug!(
                request_id = %request_id,
                rejection = %rejection.body_text(),
                "Unreadable chat request body"
            );
            ChatRequest::default()
        }
    };

    let Some(prompt) = request.prompt() else {
        tracing::info!(request_id = %request_id, "Rejected chat request without message");
        return Err(Error::BadRequest(EMPTY_MESSAGE_REPLY.to_string()));
    };

    let start = std::time::Instant::now();
    tracing::info!(
        request_id = %request_id,
        model = %state.generator.model_name(),
        chars = prompt.chars().count(),
        "Received chat request"
    );

    match relay_message(state.generator.as_ref(), prompt).await {
        Ok(reply) => {
            tracing::info!(
                request_id = %request_id,
                latency_ms = start.elapsed().as_millis() as u64,
                "Relayed reply"
            );
            Ok(Json(ChatReply::new(reply)))
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                latency_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Upstream call failed"
            );
            match state.config.relay.error_mode {
                ErrorMode::Legacy => Ok(Json(ChatReply::new(e.reply_text()))),
                ErrorMode::Strict => Err(e),
            }
        }
    }
}

/// Handle GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.generator.model_name(),
    }))
}
