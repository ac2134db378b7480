//! Shared types and errors for the modelport provider adapters.
//!
//! This crate provides the plain data every other modelport crate speaks:
//! - `ModelportError` — unified error taxonomy
//! - `ModelInfo` — one catalog entry (static or discovered)
//! - `ProviderSettings` — per-provider user settings
//! - `ProviderConfig` — which settings/environment keys hold credentials

use serde::{Deserialize, Serialize};

/// Unified error type for all modelport subsystems.
#[derive(Debug, thiserror::Error)]
pub enum ModelportError {
    // === Credential Errors ===
    #[error("Missing API key for {provider} provider")]
    MissingCredentials { provider: String },

    #[error("Missing configuration for {provider} provider")]
    MissingConfiguration { provider: String },

    // === LLM Provider Errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    // === Generic ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ModelportError {
    /// Returns `true` if the error is transient and the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelportError::RateLimited { .. }
                | ModelportError::ProviderError { retryable: true, .. }
        )
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ModelportError::MissingCredentials { .. }
                | ModelportError::MissingConfiguration { .. }
                | ModelportError::AuthError { .. }
        )
    }
}

/// A convenience alias for `Result<T, ModelportError>`.
pub type Result<T> = std::result::Result<T, ModelportError>;

// ---------------------------------------------------------------------------
// ModelInfo — one entry of a provider's model catalog
// ---------------------------------------------------------------------------

/// Token ceiling used when a backend does not report a context window.
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Backend model id, sent verbatim in requests.
    pub name: String,
    /// Human-facing display name.
    pub label: String,
    /// Display name of the provider that owns the model.
    pub provider: String,
    pub max_token_allowed: u32,
}

impl ModelInfo {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        provider: impl Into<String>,
        max_token_allowed: u32,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            provider: provider.into(),
            max_token_allowed,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderSettings — user settings for one provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Overrides the base URL otherwise read from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Disabled providers report no models.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            enabled: true,
        }
    }
}

impl ProviderSettings {
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderConfig — credential key descriptor
// ---------------------------------------------------------------------------

/// Names the settings/environment entries that hold a provider's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub base_url_key: Option<&'static str>,
    pub api_token_key: &'static str,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
