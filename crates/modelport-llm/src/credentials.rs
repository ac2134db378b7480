//! Credential resolution: which base URL and API key a provider call uses.
//!
//! Resolution order, highest priority first:
//!
//! - base URL: provider settings, then the server environment map, then the
//!   process environment (both under `base_url_key`). Trailing `/` is stripped.
//! - API key: the explicit per-provider key map (keyed by provider display
//!   name), then the server environment map, then the process environment
//!   (both under `api_token_key`).
//!
//! Empty strings count as absent at every step.

use std::collections::HashMap;
use std::fmt;

use modelport_types::{ProviderConfig, ProviderSettings};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything a caller may supply to locate credentials for one provider.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Explicit API keys keyed by provider display name.
    pub api_keys: HashMap<String, String>,
    /// Settings for the provider being resolved.
    pub provider_settings: Option<ProviderSettings>,
    /// Server-side environment values, consulted before the process environment.
    pub server_env: HashMap<String, String>,
}

impl CredentialSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.into(), key.into());
        self
    }

    pub fn with_settings(mut self, settings: ProviderSettings) -> Self {
        self.provider_settings = Some(settings);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_env.insert(key.into(), value.into());
        self
    }

    /// Providers without settings count as enabled.
    pub fn is_enabled(&self) -> bool {
        self.provider_settings.as_ref().map_or(true, |s| s.enabled)
    }
}

/// The named entries one resolution reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub base_url_key: Option<String>,
    pub api_token_key: String,
}

impl CredentialKeys {
    pub fn new(base_url_key: Option<&str>, api_token_key: &str) -> Self {
        Self {
            base_url_key: base_url_key.map(String::from),
            api_token_key: api_token_key.to_string(),
        }
    }

    /// Keys for a provider whose endpoint is fixed by its client.
    pub fn token_only(api_token_key: &str) -> Self {
        Self::new(None, api_token_key)
    }
}

impl From<&ProviderConfig> for CredentialKeys {
    fn from(config: &ProviderConfig) -> Self {
        Self::new(config.base_url_key, config.api_token_key)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CredentialResolver
// ---------------------------------------------------------------------------

/// Hook that turns caller-supplied sources into concrete credentials.
pub trait CredentialResolver: Send + Sync {
    fn resolve(
        &self,
        provider: &str,
        sources: &CredentialSources,
        keys: &CredentialKeys,
    ) -> ResolvedCredentials;
}

/// Default resolver: settings, then server environment, then process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialResolver {
    read_process_env: bool,
}

impl EnvCredentialResolver {
    pub fn new() -> Self {
        Self {
            read_process_env: true,
        }
    }

    /// A resolver that never reads the process environment.
    pub fn isolated() -> Self {
        Self {
            read_process_env: false,
        }
    }

    fn lookup(&self, sources: &CredentialSources, key: &str) -> Option<String> {
        non_empty(sources.server_env.get(key).cloned()).or_else(|| {
            if self.read_process_env {
                non_empty(std::env::var(key).ok())
            } else {
                None
            }
        })
    }
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(
        &self,
        provider: &str,
        sources: &CredentialSources,
        keys: &CredentialKeys,
    ) -> ResolvedCredentials {
        let base_url = non_empty(
            sources
                .provider_settings
                .as_ref()
                .and_then(|s| s.base_url.clone()),
        )
        .or_else(|| {
            keys.base_url_key
                .as_deref()
                .and_then(|key| self.lookup(sources, key))
        })
        .map(|url| url.trim_end_matches('/').to_string());

        let api_key = non_empty(sources.api_keys.get(provider).cloned())
            .or_else(|| self.lookup(sources, &keys.api_token_key));

        ResolvedCredentials { base_url, api_key }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
