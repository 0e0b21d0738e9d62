use crate::error::RagError;
use providers::{EmbeddingProvider, ProviderError, ProviderRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Adapts an [`EmbeddingProvider`] to a fixed output dimension.
///
/// Every vector coming back from the provider is checked: wrong count, wrong
/// length or non-finite components are reported as
/// [`RagError::EmbeddingUnavailable`] rather than passed on.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimension: usize) -> Self {
        Self {
            provider,
            dimension,
            batch_size: 64,
        }
    }

    pub fn from_registry(
        registry: &ProviderRegistry,
        name: Option<&str>,
        dimension: usize,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(registry.embedding(name)?, dimension))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        // request() guarantees one vector per input
        Ok(vectors.remove(0))
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let resp = self.provider.embed(texts).await.map_err(|e| {
            warn!(error = %e, "embedding provider failed");
            RagError::from(e)
        })?;
        if resp.vectors.len() != texts.len() {
            return Err(RagError::EmbeddingUnavailable(format!(
                "provider returned {} vectors for {} texts",
                resp.vectors.len(),
                texts.len()
            )));
        }
        for vector in &resp.vectors {
            self.validate(vector)?;
        }
        debug!(count = texts.len(), dimension = self.dimension, "embedded texts");
        Ok(resp.vectors)
    }

    fn validate(&self, vector: &[f32]) -> Result<(), RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::EmbeddingUnavailable(format!(
                "provider returned vector of length {}, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::EmbeddingUnavailable(
                "provider returned non-finite values".into(),
            ));
        }
        Ok(())
    }
}
