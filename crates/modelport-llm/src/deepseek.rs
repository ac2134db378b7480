use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::ChatDialect;
use crate::credentials::{
    CredentialKeys, CredentialResolver, CredentialSources, EnvCredentialResolver,
};
use crate::listing::{self, Endpoint, ListingTarget};
use crate::{InstanceOptions, LanguageModel, ModelSettings, Provider};
use modelport_types::{ModelInfo, ModelportError, ProviderConfig};

pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";

const NAME: &str = "Deepseek";

const CONFIG: ProviderConfig = ProviderConfig {
    base_url_key: None,
    api_token_key: "DEEPSEEK_API_KEY",
};

// ---------------------------------------------------------------------------
// DeepSeekClient
// ---------------------------------------------------------------------------

/// Client for the DeepSeek API. Owns its endpoint; callers only supply a key.
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl DeepSeekClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEEPSEEK_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self, model_id: &str, settings: ModelSettings) -> LanguageModel {
        LanguageModel::new(
            NAME,
            model_id,
            self.base_url.clone(),
            self.api_key.clone(),
            settings,
            ChatDialect::DeepSeek,
            self.client.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// DeepseekProvider
// ---------------------------------------------------------------------------

pub struct DeepseekProvider {
    http: reqwest::Client,
    resolver: Arc<dyn CredentialResolver>,
    listing_keys: CredentialKeys,
    static_models: Vec<ModelInfo>,
}

impl DeepseekProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            resolver: Arc::new(EnvCredentialResolver::new()),
            // Model listing reads the SiliconFlow entries; see `with_listing_keys`.
            listing_keys: CredentialKeys::new(
                Some("SILICON_BASED_API_BASE_URL"),
                "SILICON_BASED_API_KEY",
            ),
            static_models: vec![
                ModelInfo::new("deepseek-coder", "Deepseek-Coder", NAME, 8000),
                ModelInfo::new("deepseek-chat", "Deepseek-Chat", NAME, 8000),
                ModelInfo::new("deepseek-reasoner", "Deepseek-Reasoner", NAME, 8000),
            ],
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Keys used to locate the `/models` endpoint and its bearer token.
    pub fn with_listing_keys(mut self, keys: CredentialKeys) -> Self {
        self.listing_keys = keys;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn listing_keys(&self) -> &CredentialKeys {
        &self.listing_keys
    }
}

impl Default for DeepseekProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for DeepseekProvider {
    fn id(&self) -> &str {
        "deepseek"
    }

    fn name(&self) -> &str {
        NAME
    }

    fn api_key_link(&self) -> &str {
        "https://platform.deepseek.com/apiKeys"
    }

    fn config(&self) -> &ProviderConfig {
        &CONFIG
    }

    fn static_models(&self) -> &[ModelInfo] {
        &self.static_models
    }

    async fn dynamic_models(&self, sources: &CredentialSources) -> Vec<ModelInfo> {
        listing::list_dynamic_models(
            &self.http,
            self.resolver.as_ref(),
            ListingTarget {
                provider: NAME,
                keys: &self.listing_keys,
                endpoint: Endpoint::Resolved,
                static_models: &self.static_models,
            },
            sources,
        )
        .await
    }

    fn model_instance(&self, options: &InstanceOptions) -> Result<LanguageModel, ModelportError> {
        let sources = options.sources_for(NAME);
        let resolved = self
            .resolver
            .resolve(NAME, &sources, &CredentialKeys::token_only(CONFIG.api_token_key));

        let api_key = resolved
            .api_key
            .ok_or_else(|| ModelportError::MissingCredentials {
                provider: NAME.to_string(),
            })?;

        Ok(DeepSeekClient::new(api_key)
            .with_http_client(self.http.clone())
            .model(&options.model, options.settings.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use modelport_types::ProviderSettings;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> DeepseekProvider {
        DeepseekProvider::new().with_resolver(Arc::new(EnvCredentialResolver::isolated()))
    }

    #[test]
    fn static_catalog() {
        let p = provider();
        assert_eq!(p.name(), "Deepseek");
        assert_eq!(p.api_key_link(), "https://platform.deepseek.com/apiKeys");
        assert_eq!(p.config().api_token_key, "DEEPSEEK_API_KEY");
        assert!(p.config().base_url_key.is_none());

        let names: Vec<&str> = p.static_models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["deepseek-coder", "deepseek-chat", "deepseek-reasoner"]);
        assert!(p
            .static_models()
            .iter()
            .all(|m| m.max_token_allowed == 8000 && m.provider == "Deepseek"));
        assert_eq!(p.static_models()[2].label, "Deepseek-Reasoner");
    }

    #[test]
    fn model_instance_without_key_names_provider() {
        let err = provider()
            .model_instance(&InstanceOptions::new("deepseek-chat"))
            .unwrap_err();
        assert!(matches!(err, ModelportError::MissingCredentials { .. }));
        assert_eq!(err.to_string(), "Missing API key for Deepseek provider");
    }

    #[test]
    fn model_instance_ignores_listing_keys() {
        // The SiliconFlow key feeds listing only, never instantiation.
        let options =
            InstanceOptions::new("deepseek-chat").with_env("SILICON_BASED_API_KEY", "sk-silicon");
        assert!(provider().model_instance(&options).is_err());
    }

    #[test]
    fn model_instance_binds_sdk_endpoint() {
        let options = InstanceOptions::new("deepseek-reasoner")
            .with_env("DEEPSEEK_API_KEY", "sk-ds")
            .with_provider_settings("Deepseek", ProviderSettings::with_base_url("http://ignored"));

        let model = provider().model_instance(&options).unwrap();
        assert_eq!(model.model_id(), "deepseek-reasoner");
        assert_eq!(model.provider(), "Deepseek");
        assert_eq!(model.base_url(), DEEPSEEK_API_BASE);
        assert_eq!(model.dialect(), ChatDialect::DeepSeek);
    }

    #[test]
    fn explicit_key_is_keyed_by_display_name() {
        let options = InstanceOptions::new("deepseek-chat").with_api_key("Deepseek", "sk-explicit");
        assert!(provider().model_instance(&options).is_ok());
    }

    #[tokio::test]
    async fn dynamic_models_without_base_url_is_empty() {
        let sources = CredentialSources::new().with_api_key("Deepseek", "sk");
        assert!(provider().dynamic_models(&sources).await.is_empty());
    }

    #[tokio::test]
    async fn dynamic_models_use_listing_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-silicon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "deepseek-chat" },
                    { "id": "deepseek-v3", "context_window": 64000 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sources = CredentialSources::new()
            .with_env("SILICON_BASED_API_BASE_URL", server.uri())
            .with_env("SILICON_BASED_API_KEY", "sk-silicon");
        let models = provider().dynamic_models(&sources).await;
        assert_eq!(
            models,
            vec![ModelInfo::new("deepseek-v3", "deepseek-v3", "Deepseek", 64000)]
        );
    }

    #[tokio::test]
    async fn listing_keys_can_be_injected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-own"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "deepseek-v3" }]
            })))
            .mount(&server)
            .await;

        let provider = provider().with_listing_keys(CredentialKeys::new(
            Some("DEEPSEEK_API_BASE_URL"),
            "DEEPSEEK_API_KEY",
        ));
        let sources = CredentialSources::new()
            .with_env("DEEPSEEK_API_BASE_URL", server.uri())
            .with_env("DEEPSEEK_API_KEY", "sk-own");
        let models = provider.dynamic_models(&sources).await;
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].max_token_allowed, 8000);
    }

    #[tokio::test]
    async fn client_surfaces_reasoning_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-ds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ds-1",
                "model": "deepseek-reasoner",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "4",
                        "reasoning_content": "2 + 2 is 4."
                    },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 8, "completion_tokens": 9, "total_tokens": 17 }
            })))
            .mount(&server)
            .await;

        let model = DeepSeekClient::new("sk-ds")
            .with_base_url(server.uri())
            .model("deepseek-reasoner", ModelSettings::default());
        let resp = model.prompt(None, "2 + 2?").await.unwrap();
        assert_eq!(resp.text, "4");
        assert_eq!(resp.reasoning.as_deref(), Some("2 + 2 is 4."));
    }
}
