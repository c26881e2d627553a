//! Adapter for the remote chat-completion model.
//!
//! Handlers never talk HTTP to the model directly: they go through the
//! [`ChatModel`] trait so the production client can be swapped for a scripted
//! one in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod client;
pub mod extract;
pub mod prompts;

pub use client::ChatCompletionsClient;

/// Token budget for a full meal plan reply.
pub const MEAL_PLAN_MAX_TOKENS: u32 = 1500;
/// Token budget for a chatbot reply.
pub const CHAT_MAX_TOKENS: u32 = 250;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing API key: set LLM_API_KEY in the environment")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from model API: missing choices/message/content")]
    InvalidResponse,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the conversation and returns the text of the first choice.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32)
        -> Result<String, LlmError>;
}
