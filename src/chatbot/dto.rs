use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// Profile hints the client may attach to personalise replies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPreferences {
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub calorie_target: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub user_preferences: Option<ChatPreferences>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}
