//! Live model discovery through a backend's `GET /models` endpoint.
//!
//! Both adapters share this path. Listing never fails: incomplete
//! credentials skip the request, and any transport, status or parse failure
//! is logged and yields an empty list, so callers fall back to the static
//! catalog.

use serde::Deserialize;

use crate::credentials::{CredentialKeys, CredentialResolver, CredentialSources};
use modelport_types::{ModelInfo, ModelportError, DEFAULT_MAX_TOKENS};

/// Where the `/models` request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// Use the base URL produced by credential resolution.
    Resolved,
    /// Always use this base URL; resolution only supplies the key.
    Fixed(&'a str),
}

/// One adapter's listing parameters.
#[derive(Debug, Clone, Copy)]
pub struct ListingTarget<'a> {
    pub provider: &'a str,
    pub keys: &'a CredentialKeys,
    pub endpoint: Endpoint<'a>,
    pub static_models: &'a [ModelInfo],
}

/// Entries are kept as raw JSON so one odd entry cannot sink the rest.
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<serde_json::Value>,
}

/// Resolve credentials for `target` and list the models the backend reports
/// beyond the static catalog.
pub async fn list_dynamic_models(
    http: &reqwest::Client,
    resolver: &dyn CredentialResolver,
    target: ListingTarget<'_>,
    sources: &CredentialSources,
) -> Vec<ModelInfo> {
    let resolved = resolver.resolve(target.provider, sources, target.keys);
    let base_url = match target.endpoint {
        Endpoint::Resolved => resolved.base_url,
        Endpoint::Fixed(url) => Some(url.to_string()),
    };

    let (Some(base_url), Some(api_key)) = (base_url, resolved.api_key) else {
        tracing::debug!(
            provider = %target.provider,
            "Credentials incomplete, skipping dynamic model listing"
        );
        return Vec::new();
    };

    match fetch_models(http, target.provider, &base_url, &api_key, target.static_models).await {
        Ok(models) => {
            tracing::debug!(
                provider = %target.provider,
                count = models.len(),
                "Fetched dynamic models"
            );
            models
        }
        Err(e) => {
            tracing::warn!(provider = %target.provider, error = %e, "Error fetching models");
            Vec::new()
        }
    }
}

async fn fetch_models(
    http: &reqwest::Client,
    provider: &str,
    base_url: &str,
    api_key: &str,
    static_models: &[ModelInfo],
) -> Result<Vec<ModelInfo>, ModelportError> {
    let url = format!("{}/models", base_url.trim_end_matches('/'));
    tracing::debug!(provider = %provider, url = %url, "Listing models");

    let transport_error = |e: reqwest::Error| ModelportError::ProviderError {
        provider: provider.to_string(),
        status: 0,
        message: e.to_string(),
        retryable: true,
    };

    let resp = http
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(transport_error)?;
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(ModelportError::ProviderError {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: body,
            retryable: status.is_server_error(),
        });
    }

    let parsed: ModelsResponse = serde_json::from_str(&body)?;
    Ok(to_model_infos(parsed.data, provider, static_models))
}

/// Drop ids already in the static catalog and map the rest, keeping backend order.
/// Entries without a string `id` are skipped.
fn to_model_infos(
    remote: Vec<serde_json::Value>,
    provider: &str,
    static_models: &[ModelInfo],
) -> Vec<ModelInfo> {
    remote
        .iter()
        .filter_map(|entry| {
            let id = entry["id"].as_str()?;
            if static_models.iter().any(|s| s.name == id) {
                return None;
            }
            Some(ModelInfo::new(
                id,
                id,
                provider,
                context_window(&entry["context_window"]),
            ))
        })
        .collect()
}

/// A positive numeric window, truncated and saturated to `u32`; anything else
/// falls back to [`DEFAULT_MAX_TOKENS`].
fn context_window(value: &serde_json::Value) -> u32 {
    let window = match value.as_u64() {
        Some(w) => w,
        None => match value.as_f64() {
            Some(w) if w.is_finite() && w >= 1.0 => w as u64,
            _ => 0,
        },
    };
    if window == 0 {
        DEFAULT_MAX_TOKENS
    } else {
        u32::try_from(window).unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
