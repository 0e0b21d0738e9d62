//! Offline embedding provider based on feature hashing.
//!
//! Every lower-cased alphanumeric token (and every adjacent token pair) is
//! hashed with blake3 into one of `dimension` buckets with a sign taken from
//! the hash, then the vector is scaled to unit length. Texts sharing words
//! land close together, which is enough to run the pipeline without network
//! access.

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }
        let tokens = tokenize(text);
        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let joined = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, joined.as_bytes(), 0.5);
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = blake3::hash(feature);
        let bytes = hash.as_bytes();
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&bytes[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        if self.dimension == 0 {
            return Err(ProviderError::RequestFailed(
                "hashing provider configured with zero dimension".into(),
            ));
        }
        Ok(EmbedResponse {
            vectors: texts.iter().map(|t| self.embed_one(t)).collect(),
        })
    }
}
