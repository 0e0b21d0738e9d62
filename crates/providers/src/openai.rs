use crate::{EmbedResponse, EmbeddingProvider, ProviderError};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    /// Requested output size for models that support shortening.
    pub dimensions: Option<usize>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.cfg.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<usize>,
        }

        let body = EmbedRequest {
            model: &self.cfg.embedding_model,
            input: texts,
            dimensions: self.cfg.dimensions,
        };

        debug!(count = texts.len(), model = %self.cfg.embedding_model, "requesting embeddings");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }

        let parsed: EmbeddingApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        Ok(EmbedResponse {
            vectors: order_by_index(parsed.data),
        })
    }
}

fn order_by_index(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_rows_are_reordered_by_index() {
        let raw = r#"{"data":[
            {"index":1,"embedding":[0.0,1.0]},
            {"index":0,"embedding":[1.0,0.0]}
        ]}"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(raw).unwrap();
        let vectors = order_by_index(parsed.data);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = OpenAiProvider::new(OpenAiConfig {
            api_key: "k".into(),
            base_url: "https://api.openai.com/".into(),
            embedding_model: "text-embedding-3-small".into(),
            dimensions: None,
        });
        assert_eq!(p.endpoint(), "https://api.openai.com/v1/embeddings");
    }
}
