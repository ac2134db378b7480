use std::collections::HashMap;

use async_trait::async_trait;

use crate::credentials::CredentialSources;
use crate::{LanguageModel, ModelSettings};
use modelport_types::{ModelInfo, ModelportError, ProviderConfig, ProviderSettings};

// ---------------------------------------------------------------------------
// InstanceOptions
// ---------------------------------------------------------------------------

/// Inputs for [`Provider::model_instance`].
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    pub model: String,
    pub server_env: HashMap<String, String>,
    /// Explicit API keys keyed by provider display name.
    pub api_keys: HashMap<String, String>,
    /// Settings for every provider, keyed by display name.
    pub provider_settings: HashMap<String, ProviderSettings>,
    pub settings: ModelSettings,
}

impl InstanceOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.into(), key.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_env.insert(key.into(), value.into());
        self
    }

    pub fn with_provider_settings(
        mut self,
        provider: impl Into<String>,
        settings: ProviderSettings,
    ) -> Self {
        self.provider_settings.insert(provider.into(), settings);
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The credential sources that apply to one provider.
    pub fn sources_for(&self, provider: &str) -> CredentialSources {
        CredentialSources {
            api_keys: self.api_keys.clone(),
            provider_settings: self.provider_settings.get(provider).cloned(),
            server_env: self.server_env.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// The capability set every backend adapter implements.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable lowercase identifier, e.g. for command-line selection.
    fn id(&self) -> &str;
    /// Display name; also the key for explicit API keys and settings.
    fn name(&self) -> &str;
    /// Where a user obtains an API key.
    fn api_key_link(&self) -> &str;
    fn config(&self) -> &ProviderConfig;
    fn static_models(&self) -> &[ModelInfo];

    /// Models reported by the backend that are not in the static catalog.
    /// Never fails; unavailable backends yield an empty list.
    async fn dynamic_models(&self, sources: &CredentialSources) -> Vec<ModelInfo>;

    /// Bind a model handle. Fails when no API key can be resolved.
    fn model_instance(&self, options: &InstanceOptions) -> Result<LanguageModel, ModelportError>;

    /// Static catalog followed by the dynamic one. Empty when the provider's
    /// settings disable it.
    async fn models(&self, sources: &CredentialSources) -> Vec<ModelInfo> {
        if !sources.is_enabled() {
            tracing::debug!(provider = %self.name(), "Provider disabled, skipping models");
            return Vec::new();
        }
        let mut all = self.static_models().to_vec();
        all.extend(self.dynamic_models(sources).await);
        all
    }
}

// ---------------------------------------------------------------------------
// DynProvider
// ---------------------------------------------------------------------------

pub struct DynProvider(Box<dyn Provider>);

impl DynProvider {
    pub fn new(provider: impl Provider + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn api_key_link(&self) -> &str {
        self.0.api_key_link()
    }

    pub fn config(&self) -> &ProviderConfig {
        self.0.config()
    }

    pub fn static_models(&self) -> &[ModelInfo] {
        self.0.static_models()
    }

    pub async fn dynamic_models(&self, sources: &CredentialSources) -> Vec<ModelInfo> {
        self.0.dynamic_models(sources).await
    }

    pub async fn models(&self, sources: &CredentialSources) -> Vec<ModelInfo> {
        self.0.models(sources).await
    }

    pub fn model_instance(
        &self,
        options: &InstanceOptions,
    ) -> Result<LanguageModel, ModelportError> {
        self.0.model_instance(options)
    }

    /// Whether `key` names this provider by id or display name (case-insensitive).
    pub fn matches(&self, key: &str) -> bool {
        self.id().eq_ignore_ascii_case(key) || self.name().eq_ignore_ascii_case(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
