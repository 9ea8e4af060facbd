//! hybrid-search library
//!
//! Semantic + keyword document search over SQLite, fused with Reciprocal
//! Rank Fusion.
//!
//! # Modules
//!
//! - `search`: rank fusion, rank sources, document store and orchestrator
//! - `embedding`: embedding providers (Ollama, OpenAI, offline HTP)
//! - `config`: run configuration and validation
//! - `error`: shared error type

pub mod config;
pub mod embedding;
pub mod error;
pub mod search;

// Re-exports for convenience
pub use config::{AppConfig, EmbeddingConfig, ProviderKind};
pub use embedding::{create_provider, EmbeddingProvider};
pub use error::{Result, SearchError};
pub use search::fusion::{
    reciprocal_rank_fusion, DocumentId, FusedResult, FusionParams, RankFusionEngine, RankedList,
};
pub use search::{SearchEngine, SearchResult};
