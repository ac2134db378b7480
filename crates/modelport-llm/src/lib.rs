//! Provider adapters for DeepSeek and the SiliconFlow aggregator.
//!
//! Provides the `Provider` trait, `DynProvider` wrapper, credential
//! resolution, live model listing, and `LanguageModel` handles that run chat
//! completions against the resolved backend.

mod chat;
pub mod credentials;
mod deepseek;
pub mod listing;
mod model;
mod openai_compatible;
mod provider;
mod siliconflow;
mod types;

pub use chat::ChatDialect;
pub use credentials::{
    CredentialKeys, CredentialResolver, CredentialSources, EnvCredentialResolver,
    ResolvedCredentials,
};
pub use deepseek::{DeepSeekClient, DeepseekProvider, DEEPSEEK_API_BASE};
pub use model::LanguageModel;
pub use openai_compatible::OpenAiCompatibleClient;
pub use provider::*;
pub use siliconflow::{SiliconFlowProvider, SILICONFLOW_API_BASE};
pub use types::*;

pub use modelport_types::{ModelInfo, ModelportError, ProviderConfig, ProviderSettings};

/// Every adapter this crate ships, using the default credential resolver.
pub fn builtin_providers() -> Vec<DynProvider> {
    vec![
        DynProvider::new(DeepseekProvider::new()),
        DynProvider::new(SiliconFlowProvider::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_providers_are_distinct() {
        let providers = builtin_providers();
        assert_eq!(providers.len(), 2);
        assert!(providers[0].matches("deepseek"));
        assert!(providers[1].matches("siliconflow"));
        assert!(providers[1].matches("硅基"));
    }

    #[test]
    fn static_catalogs_do_not_share_ids() {
        let providers = builtin_providers();
        let mut seen = std::collections::HashSet::new();
        for p in &providers {
            for m in p.static_models() {
                assert!(seen.insert(m.name.clone()), "duplicate id {}", m.name);
                assert_eq!(m.provider, p.name());
            }
        }
    }
}
