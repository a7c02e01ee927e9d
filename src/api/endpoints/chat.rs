//! AI assistant chat endpoint.
//!
//! `POST /api/chat` — one message in, one reply out. Errors use a flat
//! `{"error": "..."}` body rather than the coded API error shape.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::chat::{self, ChatError, ChatRequest};

#[derive(Serialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Serialize)]
pub struct ChatErrorBody {
    pub error: String,
}

/// Build a chat error response.
pub fn chat_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ChatErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            ChatError::EmptyMessage | ChatError::MessageTooLong => StatusCode::BAD_REQUEST,
            ChatError::NotConfigured | ChatError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        chat_error(status, self.to_string())
    }
}

/// `POST /api/chat`
pub async fn send(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Malformed chat request");
            return chat_error(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    match chat::reply(ctx.core.llm(), &request).await {
        Ok(reply) => Json(ChatReply { reply }).into_response(),
        Err(err) => err.into_response(),
    }
}
