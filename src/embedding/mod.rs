//! Embedding providers
//!
//! A provider turns texts into fixed-length vectors, one per input and in
//! input order. Remote providers make a single attempt per call; retry
//! policy belongs to the caller.

mod htp;
mod http;
mod ollama;
mod openai;

pub use htp::HtpEmbedder;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::fmt::Debug;
use tracing::info;

use crate::config::{EmbeddingConfig, ProviderKind};
use crate::error::{Result, SearchError};

pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a batch of texts
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector length produced by every call
    fn dimensions(&self) -> usize;

    /// Backend name (e.g. "ollama", "openai", "local")
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Embed one text
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| {
            SearchError::MalformedResponse("provider returned no vector for query".to_string())
        })
    }
}

/// Build the provider selected by `config`.
///
/// The configuration is validated first, so a missing API key fails here
/// before any request is sent.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    config.validate()?;

    let provider: Box<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Ollama => Box::new(OllamaProvider::new(config)?),
        ProviderKind::Openai => Box::new(OpenAiProvider::new(config)?),
        ProviderKind::Local => Box::new(HtpEmbedder::with_dimensions(config.dimensions())?),
    };

    info!(
        provider = provider.name(),
        model = provider.model(),
        dimensions = provider.dimensions(),
        "Embedding provider ready"
    );
    Ok(provider)
}

/// Check a provider payload: one vector per input, each `dimensions` long.
pub(crate) fn check_shape(vectors: &[Vec<f32>], expected_count: usize, dimensions: usize) -> Result<()> {
    if vectors.len() != expected_count {
        return Err(SearchError::MalformedResponse(format!(
            "expected {expected_count} vectors, got {}",
            vectors.len()
        )));
    }
    if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimensions) {
        return Err(SearchError::MalformedResponse(format!(
            "vector {i} has {} dimensions, expected {dimensions}",
            v.len()
        )));
    }
    Ok(())
}
