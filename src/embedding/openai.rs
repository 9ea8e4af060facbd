//! OpenAI embedding provider (`POST /v1/embeddings`)

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, post_json};
use super::{check_shape, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::{Result, SearchError};

#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: usize,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            SearchError::InvalidConfiguration("the openai provider needs an API key".to_string())
        })?;

        Ok(Self {
            client: build_client(config.timeout_secs, Some(api_key))?,
            url: config.endpoint().to_string(),
            model: config.model().to_string(),
            dimensions: config.dimensions(),
        })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };
        let response: EmbeddingResponse = post_json(&self.client, &self.url, &request)?;

        if let Some(usage) = &response.usage {
            debug!(tokens = usage.total_tokens, "OpenAI embedding usage");
        }

        // Entries carry their input position; do not trust arrival order
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(SearchError::MalformedResponse(format!(
                "embedding indices do not cover 0..{}",
                data.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        check_shape(&vectors, texts.len(), self.dimensions)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
