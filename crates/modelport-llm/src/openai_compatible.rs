use crate::chat::ChatDialect;
use crate::{LanguageModel, ModelSettings};

// ---------------------------------------------------------------------------
// OpenAiCompatibleClient
// ---------------------------------------------------------------------------

/// Client factory for any backend speaking the OpenAI chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    provider: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Share an existing connection pool.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self, model_id: &str, settings: ModelSettings) -> LanguageModel {
        LanguageModel::new(
            self.provider.clone(),
            model_id,
            self.base_url.clone(),
            self.api_key.clone(),
            settings,
            ChatDialect::OpenAi,
            self.client.clone(),
        )
    }
}
