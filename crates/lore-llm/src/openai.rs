//! OpenAI-compatible chat completion client (`/chat/completions`).
//!
//! Works with OpenAI itself and with local servers exposing the same API
//! (llama.cpp, Ollama, LM Studio, vLLM). Wire types are private to this
//! module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::client::{CompletionRequest, LlmClient, LlmError};
use crate::settings::SharedLlmSettings;

/// Client for any endpoint implementing `/chat/completions`.
///
/// Reads the shared settings on every request, so model or endpoint changes
/// take effect immediately. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    settings: SharedLlmSettings,
    api_key: Option<String>,
}

impl OpenAiCompatibleClient {
    /// Builds a client. `api_key` is `None` for keyless local servers; when
    /// present it is sent as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the HTTP client cannot be constructed.
    pub fn new(settings: SharedLlmSettings, api_key: Option<String>) -> Result<Self, LlmError> {
        let http = Client::builder()
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            settings,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    #[instrument(skip(self, request), fields(role = %request.role))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let settings = self.settings.snapshot();
        let url = settings.chat_completions_url();

        let mut messages = Vec::with_capacity(2);
        if !request.system.trim().is_empty() {
            messages.push(Message {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &request.user,
        });

        let payload = ChatCompletionRequest {
            model: settings.model_for(request.role),
            messages,
            temperature: settings.temperature,
        };

        debug!(
            model = payload.model,
            %url,
            user_len = request.user.len(),
            "sending chat completion request"
        );

        let mut builder = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(%url, error = %e, "chat completion request failed");
            LlmError::Request(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_owned());
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or(body, |envelope| envelope.error.message);
            error!(%status, %message, "chat completion returned an error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::Request(format!("failed to parse response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(reply_len = text.len(), "received chat completion");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LlmSettings;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, api_key: Option<&str>) -> OpenAiCompatibleClient {
        let settings = SharedLlmSettings::new(LlmSettings {
            api_base: server.url(),
            story_model: "director".to_owned(),
            character_model: "actor".to_owned(),
            temperature: 0.5,
            timeout_secs: 5,
        });
        OpenAiCompatibleClient::new(settings, api_key.map(str::to_owned)).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_role_model_and_returns_trimmed_text() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "actor",
                "messages": [
                    { "role": "system", "content": "Stay in character." },
                    { "role": "user", "content": "Greet the traveller." }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  Well met!  "}}]}"#)
            .create_async()
            .await;
        let client = client_for(&server, Some("secret"));

        // Act
        let reply = client
            .complete(&CompletionRequest::character(
                "Stay in character.",
                "Greet the traveller.",
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(reply, "Well met!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_omits_blank_system_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "director",
                "messages": [ { "role": "user", "content": "Hello" } ]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Hi"}}]}"#)
            .create_async()
            .await;
        let client = client_for(&server, None);

        let reply = client.complete(&CompletionRequest::story("", "Hello")).await.unwrap();

        assert_eq!(reply, "Hi");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_surfaces_error_envelope_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(404)
            .with_body(r#"{"error":{"message":"model 'director' not found"}}"#)
            .create_async()
            .await;
        let client = client_for(&server, None);

        let result = client.complete(&CompletionRequest::story("", "Hello")).await;

        match result {
            Err(LlmError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'director' not found");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"   "}}]}"#)
            .create_async()
            .await;
        let client = client_for(&server, None);

        let result = client.complete(&CompletionRequest::story("", "Hello")).await;

        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }
}
