//! Retrieval seams consumed by the hybrid orchestrator.
//!
//! Both rankings are independent reads over the same document universe; the
//! fusion step never sees how they were produced.

use super::fusion::RankedList;
use crate::error::Result;

/// Nearest-neighbour ranking by vector distance (closest first)
pub trait VectorRankSource {
    fn rank_by_vector(&self, query: &[f32], limit: usize) -> Result<RankedList>;
}

/// Full-text relevance ranking (most relevant first)
pub trait KeywordRankSource {
    fn rank_by_keyword(&self, query: &str, limit: usize) -> Result<RankedList>;
}
