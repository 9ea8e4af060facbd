//! Hybrid search: semantic and keyword rankings fused with Reciprocal Rank Fusion

pub mod engine;
pub mod fusion;
pub mod sources;
pub mod vectordb;

pub use engine::{hybrid_rank, SearchEngine, SearchResult};
pub use fusion::{
    reciprocal_rank_fusion, DocumentId, FusedResult, FusionParams, RankFusionEngine, RankedList,
};
pub use sources::{KeywordRankSource, VectorRankSource};
pub use vectordb::{Document, VectorDB};
