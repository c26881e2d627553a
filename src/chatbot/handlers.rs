use axum::{extract::State, Json};
use tracing::{debug, instrument};

use super::dto::{ChatRequest, ChatResponse};
use crate::{
    error::AppError,
    extractors::ApiJson,
    llm::{
        prompts::{chatbot_messages, chatbot_system_message},
        CHAT_MAX_TOKENS,
    },
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn message(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Message is required".into()));
    }

    let prefs = payload.user_preferences.unwrap_or_default();
    let system = chatbot_system_message(
        &prefs.dietary_preferences,
        &prefs.allergies,
        prefs.calorie_target,
    );
    let messages = chatbot_messages(system, &payload.history, text);

    let reply = state.llm.complete(&messages, CHAT_MAX_TOKENS).await?;
    debug!(chars = reply.len(), "chatbot reply received");
    Ok(Json(ChatResponse { response: reply }))
}
