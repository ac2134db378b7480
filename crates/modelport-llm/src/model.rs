use std::fmt;

use crate::chat::{self, ChatDialect};
use crate::{Message, ModelSettings, Request, Response};
use modelport_types::ModelportError;

// ---------------------------------------------------------------------------
// LanguageModel
// ---------------------------------------------------------------------------

/// A model handle bound to one backend endpoint, key and model id.
///
/// Handles are cheap to clone; the underlying `reqwest::Client` shares its
/// connection pool.
#[derive(Clone)]
pub struct LanguageModel {
    provider: String,
    model_id: String,
    base_url: String,
    api_key: String,
    settings: ModelSettings,
    dialect: ChatDialect,
    client: reqwest::Client,
}

impl LanguageModel {
    pub(crate) fn new(
        provider: impl Into<String>,
        model_id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        settings: ModelSettings,
        dialect: ChatDialect,
        client: reqwest::Client,
    ) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            settings,
            dialect,
            client,
        }
    }

    /// Display name of the provider that created this handle.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn dialect(&self) -> ChatDialect {
        self.dialect
    }

    /// Run a single non-streaming chat completion.
    pub async fn complete(&self, request: &Request) -> Result<Response, ModelportError> {
        let body = chat::build_request_body(&self.model_id, &self.settings, request);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            provider = %self.provider,
            model = %self.model_id,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let response_body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(chat::map_error(
                &self.provider,
                status,
                retry_after.as_deref(),
                &response_body,
            ));
        }

        let json: serde_json::Value =
            serde_json::from_str(&response_body).map_err(|e| ModelportError::ProviderError {
                provider: self.provider.clone(),
                status: status.as_u16(),
                message: format!("Failed to parse response JSON: {e}"),
                retryable: false,
            })?;

        let response = chat::parse_response(&self.provider, self.dialect, json)?;
        tracing::debug!(
            provider = %self.provider,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            finish = ?response.finish_reason,
            "Chat completion finished"
        );
        Ok(response)
    }

    /// Convenience wrapper for a single user turn with an optional system prompt.
    pub async fn prompt(
        &self,
        system: Option<&str>,
        user: &str,
    ) -> Result<Response, ModelportError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(user));
        self.complete(&Request::new(messages)).await
    }

    fn transport_error(&self, e: reqwest::Error) -> ModelportError {
        ModelportError::ProviderError {
            provider: self.provider.clone(),
            status: 0,
            message: e.to_string(),
            retryable: true,
        }
    }
}

impl fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageModel")
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FinishReason;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle(base_url: &str, settings: ModelSettings) -> LanguageModel {
        LanguageModel::new(
            "硅基",
            "silicon-pro",
            base_url,
            "sk-test",
            settings,
            ChatDialect::OpenAi,
            reqwest::Client::new(),
        )
    }

    #[test]
    fn debug_output_hides_api_key() {
        let model = handle("https://api.example.com/v1/", ModelSettings::default());
        assert_eq!(model.base_url(), "https://api.example.com/v1");
        let printed = format!("{model:?}");
        assert!(printed.contains("silicon-pro"));
        assert!(!printed.contains("sk-test"));
    }

    #[tokio::test]
    async fn complete_posts_chat_request_with_bearer_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "silicon-pro",
                "temperature": 0.5,
                "messages": [
                    { "role": "system", "content": "Be brief." },
                    { "role": "user", "content": "Hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-abc",
                "model": "silicon-pro",
                "choices": [{
                    "message": { "role": "assistant", "content": "Hello!" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = handle(
            &server.uri(),
            ModelSettings {
                temperature: Some(0.5),
                max_tokens: None,
            },
        );
        let resp = model.prompt(Some("Be brief."), "Hi").await.unwrap();
        assert_eq!(resp.id, "chatcmpl-abc");
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.finish_reason, FinishReason::EndTurn);
        assert_eq!(resp.usage.total_tokens, 5);
    }

    #[tokio::test]
    async fn complete_maps_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "2")
                    .set_body_json(json!({ "error": { "message": "slow down" } })),
            )
            .mount(&server)
            .await;

        let model = handle(&server.uri(), ModelSettings::default());
        let err = model.prompt(None, "Hi").await.unwrap_err();
        assert!(matches!(err, ModelportError::RateLimited { retry_after_ms: 2000, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn complete_rejects_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let model = handle(&server.uri(), ModelSettings::default());
        let err = model.prompt(None, "Hi").await.unwrap_err();
        match err {
            ModelportError::ProviderError {
                status, message, ..
            } => {
                assert_eq!(status, 200);
                assert!(message.contains("Failed to parse response JSON"));
            }
            other => panic!("expected ProviderError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_reports_transport_failure_as_retryable() {
        let model = handle("http://127.0.0.1:1", ModelSettings::default());
        let err = model.prompt(None, "Hi").await.unwrap_err();
        assert!(matches!(err, ModelportError::ProviderError { status: 0, .. }));
        assert!(err.is_retryable());
    }
}
