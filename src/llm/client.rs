use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatMessage, ChatModel, LlmError};
use crate::config::LlmConfig;

const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.9;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client authenticated with a bearer key.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };

        debug!(model = %self.model, messages = messages.len(), max_tokens, "sending completion request");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "model API returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        first_choice_content(&text)
    }
}

/// Pulls `choices[0].message.content` out of a raw response body.
fn first_choice_content(body: &str) -> Result<String, LlmError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|_| LlmError::InvalidResponse)?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .ok_or(LlmError::InvalidResponse)?;
    debug!(chars = content.len(), "completion received");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hello"}}]}"#;
        assert_eq!(first_choice_content(body).unwrap(), "hello");
    }

    #[test]
    fn missing_choices_is_invalid() {
        assert!(matches!(
            first_choice_content(r#"{"object":"error"}"#),
            Err(LlmError::InvalidResponse)
        ));
        assert!(matches!(
            first_choice_content(r#"{"choices":[]}"#),
            Err(LlmError::InvalidResponse)
        ));
    }

    #[test]
    fn empty_or_null_content_is_invalid() {
        assert!(matches!(
            first_choice_content(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(LlmError::InvalidResponse)
        ));
        assert!(matches!(
            first_choice_content(r#"{"choices":[{"message":{"content":""}}]}"#),
            Err(LlmError::InvalidResponse)
        ));
    }

    #[test]
    fn non_json_body_is_invalid() {
        assert!(matches!(
            first_choice_content("<html>bad gateway</html>"),
            Err(LlmError::InvalidResponse)
        ));
    }

    #[test]
    fn request_serializes_expected_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let req = CompletionRequest {
            model: "m",
            messages: &messages,
            max_tokens: 250,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "m");
        assert_eq!(v["max_tokens"], 250);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = ChatCompletionsClient::new(&LlmConfig {
            api_url: "http://127.0.0.1:9/unused".into(),
            api_key: None,
            model: "m".into(),
        });
        let err = client
            .complete(&[ChatMessage::user("hi")], 10)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }
}
