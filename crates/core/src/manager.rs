use crate::catalog::MemeCatalog;
use crate::classifier::IntentClassifier;
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::models::{Query, ScoredCandidate, SelectionResult};
use crate::retriever;
use crate::selector::Selector;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything that went into one answer.
#[derive(Debug, Clone)]
pub struct Explanation<'a> {
    pub query: Query,
    pub matched_keywords: Vec<String>,
    /// Retrieved candidates after boosting, best first.
    pub ranked: Vec<ScoredCandidate<'a>>,
    pub selection: SelectionResult<'a>,
}

/// Turns user text into a meme: classify, embed, retrieve, select.
///
/// Holds no per-request state; one manager can serve any number of
/// sessions.
pub struct RagManager {
    catalog: Arc<MemeCatalog>,
    embedder: Embedder,
    classifier: IntentClassifier,
    selector: Selector,
    top_k: usize,
}

impl RagManager {
    pub fn new(
        catalog: Arc<MemeCatalog>,
        embedder: Embedder,
        classifier: IntentClassifier,
        selector: Selector,
    ) -> Self {
        info!(
            memes = catalog.len(),
            tags = catalog.tags().len(),
            "rag manager ready"
        );
        Self {
            catalog,
            embedder,
            classifier,
            selector,
            top_k: 10,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Drop classifier labels that cannot boost anything in the catalog, so
    /// a message is never pinned to an intent with no matching meme.
    pub fn restrict_intents_to_catalog(mut self) -> Self {
        let allowed = self.selector.boostable_intents(self.catalog.tags());
        if allowed.is_empty() {
            warn!("no catalog tag matches any intent, keeping every label");
            return self;
        }
        info!(labels = allowed.len(), "restricted intents to catalog tags");
        self.classifier = self.classifier.restrict_to(&allowed);
        self
    }

    pub fn catalog(&self) -> &MemeCatalog {
        &self.catalog
    }

    pub async fn respond(&self, text: &str) -> Result<SelectionResult<'_>, RagError> {
        Ok(self.explain(text).await?.selection)
    }

    pub async fn explain(&self, text: &str) -> Result<Explanation<'_>, RagError> {
        let classification = self.classifier.classify_detailed(text);
        let embedding = self.embedder.embed(text).await?;
        let query = Query {
            text: text.to_string(),
            embedding,
            intent: classification.intent,
        };

        let candidates = retriever::search(&query.embedding, &self.catalog, self.top_k)
            .map_err(|e| {
                error!(error = %e, "query does not fit the catalog; rebuild it with the current embedder");
                e
            })?;
        debug!(
            intent = %query.intent,
            candidates = candidates.len(),
            "retrieved candidates"
        );

        let ranked = self.selector.rerank(&candidates, query.intent);
        let selection = match Selector::top_of(&ranked, query.intent) {
            Ok(selection) => selection,
            Err(RagError::EmptyCandidateSet) => {
                warn!("catalog is empty, nothing to select");
                return Err(RagError::NoMemesAvailable);
            }
            Err(e) => return Err(e),
        };
        info!(
            meme = %selection.entry.id,
            intent = %selection.intent,
            score = selection.score,
            "selected meme"
        );

        Ok(Explanation {
            query,
            matched_keywords: classification.matched_keywords,
            ranked,
            selection,
        })
    }
}
