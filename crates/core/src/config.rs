use crate::models::Intent;
use crate::selector::{BoostCombine, BoostPolicy};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub embeddings: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub selection: SelectionConfig,
    pub intents: IntentConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
    pub asset_dir: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "config/memes.toml".to_string(),
            asset_dir: "memes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub base_url: Option<String>,
    pub api_key_file: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 256,
            batch_size: 64,
            base_url: None,
            api_key_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub boost: f32,
    pub combine: BoostCombine,
    /// Intent label → extra meme tags that earn that intent's boost.
    pub intent_tags: HashMap<String, Vec<String>>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let policy = BoostPolicy::default();
        Self {
            boost: policy.amount,
            combine: policy.combine,
            intent_tags: HashMap::new(),
        }
    }
}

impl SelectionConfig {
    pub fn policy(&self) -> BoostPolicy {
        BoostPolicy {
            amount: self.boost,
            combine: self.combine,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Only classify into labels that can boost some meme in the catalog.
    pub restrict_to_catalog: bool,
    /// Intent label → extra keywords.
    pub keywords: HashMap<String, Vec<String>>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            restrict_to_catalog: true,
            keywords: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub database: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database: "data/memerag.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if self.embeddings.dimension == 0 {
            bail!("embeddings.dimension must be at least 1");
        }
        if self.embeddings.batch_size == 0 {
            bail!("embeddings.batch_size must be at least 1");
        }
        if !self.selection.boost.is_finite() || self.selection.boost < 0.0 {
            bail!("selection.boost must be a finite, non-negative number");
        }
        self.intent_keywords()?;
        self.intent_tags()?;
        Ok(())
    }

    pub fn intent_keywords(&self) -> anyhow::Result<HashMap<Intent, Vec<String>>> {
        parse_intent_map(&self.intents.keywords).context("intents.keywords")
    }

    pub fn intent_tags(&self) -> anyhow::Result<HashMap<Intent, Vec<String>>> {
        parse_intent_map(&self.selection.intent_tags).context("selection.intent_tags")
    }
}

fn parse_intent_map(
    raw: &HashMap<String, Vec<String>>,
) -> anyhow::Result<HashMap<Intent, Vec<String>>> {
    raw.iter()
        .map(|(label, values)| {
            let intent: Intent = label.parse().map_err(anyhow::Error::msg)?;
            Ok((intent, values.clone()))
        })
        .collect()
}

/// Load configuration from `path` (or `config/default` when absent, if it
/// exists), then apply `MEMERAG__SECTION__KEY` environment overrides.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("MEMERAG").separator("__"));
    let cfg = settings.build()?;
    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.retrieval.top_k, 10);
        assert_eq!(cfg.selection.policy(), BoostPolicy::default());
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memerag.toml");
        fs::write(
            &path,
            r#"
            [retrieval]
            top_k = 3

            [selection]
            boost = 0.25
            combine = "additive"

            [selection.intent_tags]
            victory = ["gg"]

            [intents.keywords]
            celebration = ["gg wp"]
            "#,
        )
        .unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.selection.combine, BoostCombine::Additive);
        assert_eq!(cfg.embeddings.provider, "hashing");
        assert!(cfg.intents.restrict_to_catalog);
        assert_eq!(
            cfg.intent_tags().unwrap().get(&Intent::Victory),
            Some(&vec!["gg".to_string()])
        );
        assert!(cfg
            .intent_keywords()
            .unwrap()
            .contains_key(&Intent::Celebration));
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.retrieval.top_k = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.selection.boost = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.intents
            .keywords
            .insert("gloating".to_string(), vec!["ha".to_string()]);
        assert!(cfg.validate().is_err());
    }
}
