//! The in-memory meme catalog.
//!
//! A catalog is built once, either from entries that already carry
//! embeddings or from raw records embedded through an [`Embedder`], and is
//! read-only afterwards. Share it behind an `Arc`.

use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::models::{MemeEntry, MemeRecord};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct MemeCatalog {
    entries: Vec<MemeEntry>,
    dimension: Option<usize>,
}

impl MemeCatalog {
    /// Assemble a catalog from pre-embedded entries. Ids must be unique and
    /// all embeddings must share one length.
    pub fn from_entries(entries: Vec<MemeEntry>) -> Result<Self, RagError> {
        let mut seen = HashSet::new();
        let mut dimension = None;
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(RagError::DuplicateMeme(entry.id.clone()));
            }
            match dimension {
                None => dimension = Some(entry.embedding.len()),
                Some(expected) if expected != entry.embedding.len() => {
                    return Err(RagError::DimensionMismatch {
                        expected,
                        actual: entry.embedding.len(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self { entries, dimension })
    }

    /// Embed every record's caption and tags and build the catalog.
    pub async fn build(records: Vec<MemeRecord>, embedder: &Embedder) -> Result<Self, RagError> {
        let texts: Vec<String> = records.iter().map(MemeRecord::embedding_text).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        let entries = records
            .into_iter()
            .zip(vectors)
            .map(|(record, vector)| MemeEntry::new(record, vector))
            .collect();
        // the embedder already rejected vectors of any other length
        let catalog = Self::from_entries(entries)?;
        info!(
            memes = catalog.len(),
            dimension = embedder.dimension(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding length shared by every entry; `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn entries(&self) -> &[MemeEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&MemeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Every distinct tag used in the catalog.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.tags.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { memes: Vec<MemeRecord> },
    Bare(Vec<MemeRecord>),
}

/// Read catalog records from a `.toml` (`[[memes]]` tables) or `.json`
/// (array, or object with a `memes` array) file.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<MemeRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str::<CatalogFile>(&content)
            .with_context(|| format!("parsing catalog {}", path.display()))?,
        Some("json") => serde_json::from_str::<CatalogFile>(&content)
            .with_context(|| format!("parsing catalog {}", path.display()))?,
        other => bail!(
            "unsupported catalog format {:?} for {}",
            other.unwrap_or(""),
            path.display()
        ),
    };
    let records = match parsed {
        CatalogFile::Wrapped { memes } => memes,
        CatalogFile::Bare(memes) => memes,
    };
    Ok(records)
}
