use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::{
    CredentialKeys, CredentialResolver, CredentialSources, EnvCredentialResolver,
};
use crate::listing::{self, Endpoint, ListingTarget};
use crate::{InstanceOptions, LanguageModel, OpenAiCompatibleClient, Provider};
use modelport_types::{ModelInfo, ModelportError, ProviderConfig};

pub const SILICONFLOW_API_BASE: &str = "https://api.siliconflow.cn/v1";

const NAME: &str = "硅基";

const CONFIG: ProviderConfig = ProviderConfig {
    base_url_key: Some("SILICON_BASED_API_BASE_URL"),
    api_token_key: "SILICON_BASED_API_KEY",
};

/// SiliconFlow aggregator. Always talks to its fixed endpoint, whatever base
/// URL the settings or environment carry.
pub struct SiliconFlowProvider {
    http: reqwest::Client,
    resolver: Arc<dyn CredentialResolver>,
    endpoint: String,
    static_models: Vec<ModelInfo>,
}

impl SiliconFlowProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            resolver: Arc::new(EnvCredentialResolver::new()),
            endpoint: SILICONFLOW_API_BASE.to_string(),
            static_models: vec![
                ModelInfo::new("silicon-base", "硅基-Base", NAME, 8000),
                ModelInfo::new("silicon-pro", "硅基-Pro", NAME, 16000),
            ],
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Replace the fixed endpoint, e.g. with a relay in front of SiliconFlow.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for SiliconFlowProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for SiliconFlowProvider {
    fn id(&self) -> &str {
        "siliconflow"
    }

    fn name(&self) -> &str {
        NAME
    }

    fn api_key_link(&self) -> &str {
        "https://cloud.siliconflow.cn/account/ak"
    }

    fn config(&self) -> &ProviderConfig {
        &CONFIG
    }

    fn static_models(&self) -> &[ModelInfo] {
        &self.static_models
    }

    async fn dynamic_models(&self, sources: &CredentialSources) -> Vec<ModelInfo> {
        let keys = CredentialKeys::from(&CONFIG);
        listing::list_dynamic_models(
            &self.http,
            self.resolver.as_ref(),
            ListingTarget {
                provider: NAME,
                keys: &keys,
                endpoint: Endpoint::Fixed(&self.endpoint),
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
            .resolve(NAME, &sources, &CredentialKeys::from(&CONFIG));

        let api_key = resolved
            .api_key
            .ok_or_else(|| ModelportError::MissingConfiguration {
                provider: NAME.to_string(),
            })?;

        Ok(OpenAiCompatibleClient::new(NAME, self.endpoint.as_str(), api_key)
            .with_http_client(self.http.clone())
            .model(&options.model, options.settings.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
