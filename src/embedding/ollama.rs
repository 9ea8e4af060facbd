//! Ollama embedding provider (`POST /api/embed`)

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, post_json};
use super::{check_shape, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::Result;

#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let host = config.endpoint().trim_end_matches('/');
        Ok(Self {
            client: build_client(config.timeout_secs, None)?,
            url: format!("{host}/api/embed"),
            model: config.model().to_string(),
            dimensions: config.dimensions(),
        })
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response: EmbedResponse = post_json(&self.client, &self.url, &request)?;

        check_shape(&response.embeddings, texts.len(), self.dimensions)?;
        debug!(count = texts.len(), "Ollama embeddings received");
        Ok(response.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::error::SearchError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(server: &MockServer, dimensions: usize) -> OllamaProvider {
        let mut config = EmbeddingConfig::new(ProviderKind::Ollama);
        config.endpoint = Some(format!("{}/", server.base_url()));
        config.dimensions = Some(dimensions);
        OllamaProvider::new(&config).unwrap()
    }

    #[test]
    fn test_embed_batch() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/embed").json_body(json!({
                "model": "albertogg/multi-qa-minilm-l6-cos-v1",
                "input": ["The dog is barking", "The cat is purring"]
            }));
            then.status(200)
                .json_body(json!({ "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]] }));
        });

        let vectors = provider(&server, 3)
            .embed(&["The dog is barking".to_string(), "The cat is purring".to_string()])
            .unwrap();

        mock.assert();
        assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
    }

    #[test]
    fn test_wrong_dimension_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200).json_body(json!({ "embeddings": [[0.1, 0.2]] }));
        });

        let err = provider(&server, 3).embed_one("bear").unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[test]
    fn test_server_error_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(404).body("model not found");
        });

        let err = provider(&server, 3).embed_one("bear").unwrap_err();
        assert!(matches!(err, SearchError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn test_empty_batch_skips_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(500);
        });

        assert!(provider(&server, 3).embed(&[]).unwrap().is_empty());
        mock.assert_calls(0);
    }
}
