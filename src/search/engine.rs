//! Search Engine - combines an embedding provider, the document store and
//! rank fusion
//!
//! The query text is embedded once, each rank source answers independently,
//! and the two lists are fused with RRF.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::fusion::{DocumentId, FusedResult, FusionParams, RankFusionEngine};
use super::sources::{KeywordRankSource, VectorRankSource};
use super::vectordb::{IndexStats, VectorDB, META_MODEL, META_PROVIDER};
use crate::config::AppConfig;
use crate::embedding::{check_shape, create_provider, EmbeddingProvider};
use crate::error::{Result, SearchError};

pub const SEMANTIC: &str = "semantic";
pub const KEYWORD: &str = "keyword";

/// Fused result with the matched document text
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub content: String,
    pub score: f64,
    pub ranks: BTreeMap<String, usize>,
}

/// Nearest-neighbour result
#[derive(Debug, Clone, Serialize)]
pub struct Neighbor {
    pub id: DocumentId,
    pub content: String,
    pub distance: f32,
}

/// Indexing statistics
#[derive(Debug, Serialize)]
pub struct IndexingStats {
    pub indexed: usize,
    pub dimension: usize,
    pub duration_ms: u128,
}

/// Rank `query_text` both ways and fuse the two lists.
///
/// The sources are independent reads; fusion starts once both have answered.
pub fn hybrid_rank<V, K>(
    vectors: &V,
    keywords: &K,
    query_vector: &[f32],
    query_text: &str,
    fusion: &RankFusionEngine,
) -> Result<Vec<FusedResult>>
where
    V: VectorRankSource + ?Sized,
    K: KeywordRankSource + ?Sized,
{
    let list_limit = fusion.params().list_limit;
    let semantic = vectors.rank_by_vector(query_vector, list_limit)?;
    let keyword = keywords.rank_by_keyword(query_text, list_limit)?;
    debug!(
        semantic = semantic.len(),
        keyword = keyword.len(),
        "Rankings ready"
    );

    Ok(fusion.fuse(&[(SEMANTIC, &semantic), (KEYWORD, &keyword)]))
}

pub struct SearchEngine {
    provider: Box<dyn EmbeddingProvider>,
    db: VectorDB,
    fusion: RankFusionEngine,
}

impl SearchEngine {
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        db: VectorDB,
        params: FusionParams,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            db,
            fusion: RankFusionEngine::new(params)?,
        })
    }

    /// Validate `config`, then build the provider and open the database.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::build(config, || VectorDB::open(&config.db_path))
    }

    /// Like [`SearchEngine::from_config`], but over a fresh in-memory store.
    /// `config.db_path` is ignored.
    pub fn in_memory(config: &AppConfig) -> Result<Self> {
        Self::build(config, VectorDB::open_in_memory)
    }

    fn build(config: &AppConfig, open: impl FnOnce() -> Result<VectorDB>) -> Result<Self> {
        config.validate()?;
        let provider = create_provider(&config.embedding)?;
        let db = open()?;
        Self::new(provider, db, config.fusion)
    }

    /// Replace the stored corpus with `texts`.
    ///
    /// Embeddings are computed and shape-checked before the store is touched,
    /// and the swap itself is a single transaction, so any failure leaves the
    /// previous index in place.
    pub fn index_corpus(&mut self, texts: &[String]) -> Result<IndexingStats> {
        let start = Instant::now();

        let embeddings = self.provider.embed(texts)?;
        let dimension = self.provider.dimensions();
        check_shape(&embeddings, texts.len(), dimension)?;

        let docs: Vec<(String, Vec<f32>)> = texts.iter().cloned().zip(embeddings).collect();
        let meta = [
            (META_PROVIDER, self.provider.name()),
            (META_MODEL, self.provider.model()),
        ];
        let ids = self.db.replace_corpus(dimension, &meta, &docs)?;

        let stats = IndexingStats {
            indexed: ids.len(),
            dimension,
            duration_ms: start.elapsed().as_millis(),
        };
        info!(
            indexed = stats.indexed,
            dimension,
            duration_ms = stats.duration_ms as u64,
            "Corpus indexed"
        );
        Ok(stats)
    }

    /// Hybrid search: semantic and keyword rankings fused with RRF
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.warn_on_model_change()?;

        let query_vector = self.provider.embed_one(query)?;
        let fused = hybrid_rank(&self.db, &self.db, &query_vector, query, &self.fusion)?;
        self.hydrate(fused)
    }

    /// Attach stored content to fused hits
    fn hydrate(&self, fused: Vec<FusedResult>) -> Result<Vec<SearchResult>> {
        let mut results = Vec::with_capacity(fused.len());
        for hit in fused {
            let doc = self
                .db
                .get_document(hit.document_id)?
                .ok_or(SearchError::MissingDocument(hit.document_id))?;
            results.push(SearchResult {
                id: hit.document_id,
                content: doc.content,
                score: hit.score,
                ranks: hit.ranks,
            });
        }
        Ok(results)
    }

    /// Semantic-only nearest neighbours
    pub fn nearest(&self, query: &str, limit: usize) -> Result<Vec<Neighbor>> {
        self.warn_on_model_change()?;

        let query_vector = self.provider.embed_one(query)?;
        let neighbors = self.db.nearest(&query_vector, limit)?;
        Ok(neighbors
            .into_iter()
            .map(|(doc, distance)| Neighbor {
                id: doc.id,
                content: doc.content,
                distance,
            })
            .collect())
    }

    pub fn get_stats(&self) -> Result<IndexStats> {
        self.db.get_stats()
    }

    pub fn fusion_params(&self) -> &FusionParams {
        self.fusion.params()
    }

    fn warn_on_model_change(&self) -> Result<()> {
        if let Some(model) = self.db.get_meta(META_MODEL)? {
            if model != self.provider.model() {
                warn!(
                    indexed_with = %model,
                    querying_with = self.provider.model(),
                    "Index was built with a different embedding model"
                );
            }
        }
        Ok(())
    }
}
