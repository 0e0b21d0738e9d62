//! Builds providers, catalog and manager from configuration.
//!
//! This is the only place that reads credentials.

use anyhow::{Context, Result};
use memerag_core::catalog::{self, MemeCatalog};
use memerag_core::config::AppConfig;
use memerag_core::{Embedder, IntentClassifier, RagManager, Selector};
use providers::hashing::HashingProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";

/// API key from `OPENAI_API_KEY`, falling back to `embeddings.api_key_file`.
pub fn read_api_key(config: &AppConfig) -> Result<Option<String>> {
    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let key = key.to_string_lossy().trim().to_string();
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }
    match &config.embeddings.api_key_file {
        Some(path) => {
            let key = std::fs::read_to_string(path)
                .with_context(|| format!("reading api key file {path}"))?;
            let key = key.trim().to_string();
            if key.is_empty() {
                warn!(path = %path, "api key file is empty");
                Ok(None)
            } else {
                Ok(Some(key))
            }
        }
        None => Ok(None),
    }
}

pub fn build_registry(config: &AppConfig) -> Result<ProviderRegistry> {
    Ok(build_registry_with_key(config, read_api_key(config)?))
}

pub fn build_registry_with_key(config: &AppConfig, api_key: Option<String>) -> ProviderRegistry {
    let dimension = config.embeddings.dimension;
    let mut reg = ProviderRegistry::new()
        .with_embedding("hashing", Arc::new(HashingProvider::new(dimension)));

    if let Some(key) = api_key {
        let base_url = config
            .embeddings
            .base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string());
        // only the v3 models accept a requested output size
        let dimensions = config
            .embeddings
            .model
            .starts_with("text-embedding-3")
            .then_some(dimension);
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key,
            base_url,
            embedding_model: config.embeddings.model.clone(),
            dimensions,
        });
        reg = reg.with_embedding("openai", Arc::new(provider));
    }

    reg.set_preferred_embedding(&config.embeddings.provider)
}

pub fn build_embedder(config: &AppConfig, registry: &ProviderRegistry) -> Result<Embedder> {
    let embedder = Embedder::from_registry(registry, None, config.embeddings.dimension)
        .with_context(|| {
            format!(
                "embedding provider '{}' is not available (registered: {}); the openai provider needs OPENAI_API_KEY or embeddings.api_key_file",
                config.embeddings.provider,
                registry.names().join(", ")
            )
        })?;
    Ok(embedder.with_batch_size(config.embeddings.batch_size))
}

pub async fn load_catalog(config: &AppConfig, embedder: &Embedder) -> Result<MemeCatalog> {
    let path = Path::new(&config.catalog.path);
    let records = catalog::read_records(path)?;
    info!(path = %path.display(), records = records.len(), "embedding catalog");
    let catalog = MemeCatalog::build(records, embedder)
        .await
        .with_context(|| format!("building catalog from {}", path.display()))?;
    Ok(catalog)
}

pub async fn build_manager(config: &AppConfig, registry: &ProviderRegistry) -> Result<RagManager> {
    let embedder = build_embedder(config, registry)?;
    let catalog = Arc::new(load_catalog(config, &embedder).await?);
    let classifier = IntentClassifier::new().extend(&config.intent_keywords()?);
    let selector =
        Selector::new(config.selection.policy()).with_intent_tags(&config.intent_tags()?);
    let manager =
        RagManager::new(catalog, embedder, classifier, selector).with_top_k(config.retrieval.top_k);
    if config.intents.restrict_to_catalog {
        Ok(manager.restrict_intents_to_catalog())
    } else {
        Ok(manager)
    }
}
