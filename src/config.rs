//! Run configuration
//!
//! Everything a run needs is gathered here once at startup and validated
//! before any embedding or storage call is made.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, SearchError};
use crate::search::fusion::FusionParams;

pub const DEFAULT_DB_PATH: &str = "hybrid-search.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434/";
pub const OLLAMA_DEFAULT_MODEL: &str = "albertogg/multi-qa-minilm-l6-cos-v1";
pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
pub const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const LOCAL_MODEL: &str = "htp";

/// Which embedding backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ollama `/api/embed`
    Ollama,
    /// OpenAI `/v1/embeddings`
    Openai,
    /// Offline Harmonic Token Projection
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Openai => "openai",
            Self::Local => "local",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Ollama => OLLAMA_DEFAULT_ENDPOINT,
            Self::Openai => OPENAI_DEFAULT_ENDPOINT,
            Self::Local => "",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
            Self::Openai => OPENAI_DEFAULT_MODEL,
            Self::Local => LOCAL_MODEL,
        }
    }

    pub fn default_dimensions(&self) -> usize {
        match self {
            Self::Ollama => 384,
            Self::Openai => 1536,
            Self::Local => 384,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedding provider settings; unset fields fall back to per-provider defaults
#[derive(Clone)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub dimensions: Option<usize>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            endpoint: None,
            model: None,
            dimensions: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
            .unwrap_or_else(|| self.provider.default_dimensions())
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider == ProviderKind::Openai
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(SearchError::InvalidConfiguration(
                "the openai provider needs an API key (set OPENAI_API_KEY or pass --api-key)"
                    .to_string(),
            ));
        }
        if self.dimensions() == 0 {
            return Err(SearchError::InvalidConfiguration(
                "embedding dimensions must be > 0".to_string(),
            ));
        }
        if self.model().trim().is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "embedding model name is empty".to_string(),
            ));
        }
        if self.provider != ProviderKind::Local {
            if self.timeout_secs == 0 {
                return Err(SearchError::InvalidConfiguration(
                    "timeout must be at least 1 second".to_string(),
                ));
            }
            let endpoint = self.endpoint();
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(SearchError::InvalidConfiguration(format!(
                    "endpoint must be an http(s) URL: {endpoint}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint())
            .field("model", &self.model())
            .field("dimensions", &self.dimensions())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Complete configuration for one run
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub fusion: FusionParams,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.embedding.validate()?;
        self.fusion.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            embedding: EmbeddingConfig::new(ProviderKind::Ollama),
            fusion: FusionParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_provider() {
        let ollama = EmbeddingConfig::new(ProviderKind::Ollama);
        assert_eq!(ollama.endpoint(), OLLAMA_DEFAULT_ENDPOINT);
        assert_eq!(ollama.model(), OLLAMA_DEFAULT_MODEL);
        assert_eq!(ollama.dimensions(), 384);
        assert!(ollama.validate().is_ok());

        let openai = EmbeddingConfig::new(ProviderKind::Openai);
        assert_eq!(openai.dimensions(), 1536);
        assert_eq!(openai.model(), OPENAI_DEFAULT_MODEL);
    }

    #[test]
    fn test_openai_requires_key() {
        let mut config = EmbeddingConfig::new(ProviderKind::Openai);
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidConfiguration(_))
        ));

        config.api_key = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = EmbeddingConfig::new(ProviderKind::Ollama);
        config.dimensions = Some(0);
        assert!(config.validate().is_err());

        let mut config = EmbeddingConfig::new(ProviderKind::Ollama);
        config.endpoint = Some("localhost:11434".to_string());
        assert!(config.validate().is_err());

        let mut config = EmbeddingConfig::new(ProviderKind::Ollama);
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        // the local provider never touches the network
        let mut config = EmbeddingConfig::new(ProviderKind::Local);
        config.timeout_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_checks_fusion() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.fusion.k = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut config = EmbeddingConfig::new(ProviderKind::Openai);
        config.api_key = Some("sk-secret".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
