use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::assistant::{OutcomeStatus, Query};
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub response: String,
    pub status: OutcomeStatus,
    pub session_id: String,
}

/// `POST /chat`. Pipeline failures are answered with status `error` and a
/// 200; only an empty message is rejected.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequestBody>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("No query provided".to_string()));
    }

    let session_id = state
        .history
        .resolve_session(payload.session_id.as_deref())
        .await;
    let history = state.history.get_history(&session_id).await;

    tracing::info!("Chat query for session {}", session_id);
    let query = Query::new(text).with_session(session_id.clone());
    let outcome = state.router.handle(&query, &history).await;

    state.history.add_message(&session_id, "user", text).await;
    state
        .history
        .add_message(&session_id, "assistant", &outcome.response)
        .await;

    Ok(Json(ChatResponseBody {
        response: outcome.response,
        status: outcome.status,
        session_id,
    }))
}
