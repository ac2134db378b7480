//! CLI binary for browsing provider model catalogs and running one-shot prompts.

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use modelport_llm::{
    builtin_providers, CredentialSources, DynProvider, InstanceOptions, ModelInfo, ModelSettings,
    ProviderSettings,
};

#[derive(Parser)]
#[command(name = "modelport", version, about = "DeepSeek and SiliconFlow model catalogs from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for a provider, as NAME=KEY (NAME is the provider id or display name)
    #[arg(long = "api-key", value_name = "NAME=KEY", value_parser = parse_key_value, global = true)]
    api_keys: Vec<(String, String)>,

    /// Base URL override, applied as a provider setting
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Disable a provider (id or display name); its models are not listed
    #[arg(long = "disable", value_name = "NAME", global = true)]
    disabled: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in providers and where their credentials come from
    Providers,

    /// List models, optionally including those reported live by the backend
    Models {
        /// Only this provider (id or display name)
        #[arg(short, long)]
        provider: Option<String>,

        /// Query each backend's /models endpoint as well
        #[arg(long)]
        dynamic: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Send a single prompt to a model
    Complete {
        /// Provider id or display name
        #[arg(short, long)]
        provider: String,

        /// Model id
        #[arg(short, long)]
        model: String,

        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,

        /// The user prompt
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let providers = builtin_providers();
    let api_keys = normalize_api_keys(&providers, &cli.api_keys);
    let server_env: HashMap<String, String> = std::env::vars().collect();

    match cli.command {
        Commands::Providers => cmd_providers(&providers),
        Commands::Models {
            provider,
            dynamic,
            json,
        } => {
            let selected = select_providers(&providers, provider.as_deref())?;
            let mut models = Vec::new();
            for p in selected {
                let sources = CredentialSources {
                    api_keys: api_keys.clone(),
                    provider_settings: provider_settings(p, cli.base_url.as_deref(), &cli.disabled),
                    server_env: server_env.clone(),
                };
                if dynamic {
                    models.extend(p.models(&sources).await);
                } else if sources.is_enabled() {
                    models.extend_from_slice(p.static_models());
                }
            }
            print_models(&models, json)?;
        }
        Commands::Complete {
            provider,
            model,
            system,
            temperature,
            max_tokens,
            prompt,
        } => {
            let p = find_provider(&providers, &provider)?;
            let mut options = InstanceOptions::new(model).with_settings(ModelSettings {
                temperature,
                max_tokens,
            });
            options.api_keys = api_keys;
            options.server_env = server_env;
            if let Some(settings) = provider_settings(p, cli.base_url.as_deref(), &cli.disabled) {
                options = options.with_provider_settings(p.name(), settings);
            }

            let handle = p.model_instance(&options).map_err(|e| {
                anyhow::anyhow!("{e} (get a key at {})", p.api_key_link())
            })?;
            tracing::info!(provider = %handle.provider(), model = %handle.model_id(), "Running prompt");

            let response = handle.prompt(system.as_deref(), &prompt).await?;
            if let Some(reasoning) = &response.reasoning {
                println!("[reasoning]\n{reasoning}\n");
            }
            println!("{}", response.text);
            tracing::info!(
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                finish = ?response.finish_reason,
                "Done"
            );
        }
    }

    Ok(())
}

fn cmd_providers(providers: &[DynProvider]) {
    for p in providers {
        let config = p.config();
        println!("{} ({})", p.name(), p.id());
        println!("  API key env: {}", config.api_token_key);
        if let Some(base_url_key) = config.base_url_key {
            println!("  Base URL env: {base_url_key}");
        }
        println!("  Get a key: {}", p.api_key_link());
        println!("  Static models: {}", p.static_models().len());
    }
}

fn print_models(models: &[ModelInfo], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(models)?);
        return Ok(());
    }
    for m in models {
        println!(
            "{:<12} {:<40} {:<30} {:>8}",
            m.provider, m.name, m.label, m.max_token_allowed
        );
    }
    Ok(())
}

fn find_provider<'a>(providers: &'a [DynProvider], key: &str) -> anyhow::Result<&'a DynProvider> {
    providers
        .iter()
        .find(|p| p.matches(key))
        .ok_or_else(|| anyhow::anyhow!("Unknown provider '{key}'"))
}

fn select_providers<'a>(
    providers: &'a [DynProvider],
    key: Option<&str>,
) -> anyhow::Result<Vec<&'a DynProvider>> {
    match key {
        Some(key) => Ok(vec![find_provider(providers, key)?]),
        None => Ok(providers.iter().collect()),
    }
}

/// Settings built from `--base-url` and `--disable`, if either applies to `provider`.
fn provider_settings(
    provider: &DynProvider,
    base_url: Option<&str>,
    disabled: &[String],
) -> Option<ProviderSettings> {
    let is_disabled = disabled.iter().any(|name| provider.matches(name));
    if base_url.is_none() && !is_disabled {
        return None;
    }
    Some(ProviderSettings {
        base_url: base_url.map(String::from),
        enabled: !is_disabled,
    })
}

/// Re-key `--api-key` entries by provider display name.
fn normalize_api_keys(
    providers: &[DynProvider],
    entries: &[(String, String)],
) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(name, key)| {
            let display = match providers.iter().find(|p| p.matches(name)) {
                Some(p) => p.name().to_string(),
                None => {
                    tracing::warn!(name = %name, "API key given for unknown provider");
                    name.clone()
                }
            };
            (display, key.clone())
        })
        .collect()
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=KEY, got '{s}'"))?;
    if name.is_empty() || value.is_empty() {
        return Err(format!("expected NAME=KEY, got '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
