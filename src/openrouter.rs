use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::provider::ChatProvider;
use crate::types::{MessageRole, Turn};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

// Replies are capped at 1000 characters downstream; 500 tokens leaves headroom
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.95;
const TOP_K: u32 = 64;

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl OpenRouterClient {
    /// Build a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            client,
            model,
            endpoint: OPENROUTER_API_URL.to_string(),
        })
    }

    /// Point the client at a different chat completions URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn complete(&self, history: &[Turn]) -> Result<String> {
        debug!(
            "Sending request to OpenRouter API with {} messages",
            history.len()
        );

        let request = OpenRouterRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|turn| Message {
                    role: turn.role,
                    content: &turn.content,
                })
                .collect(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::OpenRouterApi { status, message });
        }

        let api_response: OpenRouterResponse = response.json().await?;

        let reply = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BotError::OpenRouterResponse("No choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        debug!("Received {} characters from OpenRouter API", reply.len());
        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> Result<OpenRouterClient> {
        Ok(OpenRouterClient::new(
            "test-key".to_string(),
            "test/model".to_string(),
            Duration::from_secs(5),
        )?
        .with_endpoint(format!("{}/chat/completions", server.uri())))
    }

    #[tokio::test]
    async fn sends_history_and_returns_text() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "messages": [
                    {"role": "system", "content": "be helpful"},
                    {"role": "user", "content": "when to sow wheat?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "In autumn."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server)?;
        let reply = client
            .complete(&[Turn::system("be helpful"), Turn::user("when to sow wheat?")])
            .await?;
        assert_eq!(reply, "In autumn.");
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = client_for(&server)?;
        let err = client
            .complete(&[Turn::user("hi there")])
            .await
            .expect_err("expected api error");
        match err {
            BotError::OpenRouterApi { status, message } => {
                assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_choices_is_a_response_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server)?;
        let err = client
            .complete(&[Turn::user("hi there")])
            .await
            .expect_err("expected response error");
        assert!(matches!(err, BotError::OpenRouterResponse(_)));
        Ok(())
    }
}
