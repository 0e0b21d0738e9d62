use thiserror::Error;

/// Failures of the retrieval-and-selection pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RagError {
    /// The embedding provider was unreachable or answered with something
    /// that is not a usable vector.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Query and catalog embeddings disagree in length. The catalog has to be
    /// rebuilt with the current embedder.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no candidates to select from")]
    EmptyCandidateSet,

    #[error("no memes available")]
    NoMemesAvailable,

    #[error("duplicate meme id in catalog: {0}")]
    DuplicateMeme(String),
}

impl RagError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RagError::EmbeddingUnavailable(_))
    }
}

impl From<providers::ProviderError> for RagError {
    fn from(err: providers::ProviderError) -> Self {
        RagError::EmbeddingUnavailable(err.to_string())
    }
}
