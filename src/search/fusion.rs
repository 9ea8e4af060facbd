//! Reciprocal Rank Fusion
//!
//! RRF(d) = Σ(r ∈ R) 1 / (k + r(d))
//!
//! Each ranking contributes only for the documents it contains; a document
//! missing from a list adds exactly 0 for that list. Works on ranks alone, so
//! cosine distances and BM25 scores never need to be calibrated against
//! each other.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Result, SearchError};

/// Storage-assigned document identifier
pub type DocumentId = i64;

pub const DEFAULT_K: f64 = 60.0;
pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Ordered document ids from one retrieval method, rank 1 first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedList {
    ids: Vec<DocumentId>,
}

impl RankedList {
    /// Build from ids in best-first order.
    ///
    /// Repeated ids keep their first (best) position.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut seen = HashSet::new();
        let ids = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 1-based rank of `id`, if present
    pub fn rank_of(&self, id: DocumentId) -> Option<usize> {
        self.ids.iter().position(|&d| d == id).map(|i| i + 1)
    }

    /// `(document_id, rank)` pairs in rank order
    pub fn entries(&self) -> impl Iterator<Item = (DocumentId, usize)> + '_ {
        self.ids.iter().enumerate().map(|(i, &id)| (id, i + 1))
    }

    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }
}

impl FromIterator<DocumentId> for RankedList {
    fn from_iter<I: IntoIterator<Item = DocumentId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// Tuning knobs for the fused query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusionParams {
    /// Smoothing constant, must be finite and > 0
    pub k: f64,
    /// Entries kept from each input ranking
    pub list_limit: usize,
    /// Fused results returned
    pub result_limit: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            list_limit: DEFAULT_LIST_LIMIT,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl FusionParams {
    pub fn validate(&self) -> Result<()> {
        if !self.k.is_finite() || self.k <= 0.0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "k must be a finite number > 0 (got {})",
                self.k
            )));
        }
        if self.result_limit == 0 {
            return Err(SearchError::InvalidConfiguration(
                "result limit must be > 0".to_string(),
            ));
        }
        if self.list_limit == 0 {
            return Err(SearchError::InvalidConfiguration(
                "list limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A document after fusion, with the rank it held in each contributing list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub document_id: DocumentId,
    pub score: f64,
    pub ranks: BTreeMap<String, usize>,
}

/// Pure RRF combiner; holds only validated parameters.
#[derive(Debug, Clone)]
pub struct RankFusionEngine {
    params: FusionParams,
}

impl RankFusionEngine {
    /// Fails with `InvalidConfiguration` before any scoring is possible.
    pub fn new(params: FusionParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FusionParams {
        &self.params
    }

    /// Fuse named rankings into one list ordered by descending score.
    ///
    /// Equal scores are ordered by ascending document id.
    pub fn fuse(&self, rankings: &[(&str, &RankedList)]) -> Vec<FusedResult> {
        let k = self.params.k;
        let mut fused: HashMap<DocumentId, FusedResult> = HashMap::new();

        for (name, list) in rankings {
            for (id, rank) in list.entries().take(self.params.list_limit) {
                let term = 1.0 / (k + rank as f64);
                let entry = fused.entry(id).or_insert_with(|| FusedResult {
                    document_id: id,
                    score: 0.0,
                    ranks: BTreeMap::new(),
                });
                entry.score += term;
                entry.ranks.insert((*name).to_string(), rank);
            }
        }

        let mut results: Vec<FusedResult> = fused.into_values().collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        results.truncate(self.params.result_limit);
        results
    }
}

/// Validate `params` and fuse in one step.
pub fn reciprocal_rank_fusion(
    rankings: &[(&str, &RankedList)],
    params: &FusionParams,
) -> Result<Vec<FusedResult>> {
    Ok(RankFusionEngine::new(*params)?.fuse(rankings))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: DocumentId = 1;
    const B: DocumentId = 2;
    const C: DocumentId = 3;

    fn engine(k: f64, result_limit: usize) -> RankFusionEngine {
        RankFusionEngine::new(FusionParams {
            k,
            list_limit: DEFAULT_LIST_LIMIT,
            result_limit,
        })
        .unwrap()
    }

    fn score_of(results: &[FusedResult], id: DocumentId) -> Option<f64> {
        results.iter().find(|r| r.document_id == id).map(|r| r.score)
    }

    #[test]
    fn test_reference_scenario() {
        let semantic = RankedList::from_ids([A, B, C]);
        let keyword = RankedList::from_ids([C, A]);

        let fused = engine(60.0, 5).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);

        let ids: Vec<_> = fused.iter().map(|r| r.document_id).collect();
        assert_eq!(ids, vec![A, C, B]);

        assert_eq!(fused[0].score, 1.0 / 61.0 + 1.0 / 62.0);
        assert_eq!(fused[1].score, 1.0 / 63.0 + 1.0 / 61.0);
        assert_eq!(fused[2].score, 1.0 / 62.0);
        assert!((fused[0].score - 0.032522).abs() < 1e-6);
        assert!((fused[1].score - 0.032266).abs() < 1e-6);
        assert!((fused[2].score - 0.016129).abs() < 1e-6);

        assert_eq!(fused[0].ranks.get("semantic"), Some(&1));
        assert_eq!(fused[0].ranks.get("keyword"), Some(&2));
        assert_eq!(fused[2].ranks.get("keyword"), None);
    }

    #[test]
    fn test_absent_documents_contribute_nothing() {
        let semantic = RankedList::from_ids([10, 20]);
        let keyword = RankedList::from_ids([20, 30]);

        let fused = engine(60.0, 10).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);

        assert_eq!(score_of(&fused, 10), Some(1.0 / 61.0));
        assert_eq!(score_of(&fused, 20), Some(1.0 / 62.0 + 1.0 / 61.0));
        assert_eq!(score_of(&fused, 30), Some(1.0 / 62.0));
        assert_eq!(score_of(&fused, 40), None);
        assert!(fused.iter().all(|r| r.score > 0.0));
    }

    #[test]
    fn test_empty_rankings() {
        let empty = RankedList::default();
        let fused = engine(60.0, 5).fuse(&[("semantic", &empty), ("keyword", &empty)]);
        assert!(fused.is_empty());

        assert!(engine(60.0, 5).fuse(&[]).is_empty());
    }

    #[test]
    fn test_result_limit_truncation() {
        let semantic = RankedList::from_ids(1..=8);
        let keyword = RankedList::from_ids([7, 9, 11]);

        // union is 10 documents
        for limit in [1, 3, 10, 50] {
            let fused = engine(60.0, limit).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);
            assert_eq!(fused.len(), limit.min(10));
        }
    }

    #[test]
    fn test_list_limit_truncates_inputs() {
        let semantic = RankedList::from_ids([1, 2, 3, 4]);
        let engine = RankFusionEngine::new(FusionParams {
            k: 60.0,
            list_limit: 2,
            result_limit: 10,
        })
        .unwrap();

        let fused = engine.fuse(&[("semantic", &semantic)]);
        let ids: Vec<_> = fused.iter().map(|r| r.document_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_monotonic_within_list() {
        let semantic = RankedList::from_ids([5, 6, 7]);
        let keyword = RankedList::from_ids([5, 7, 6]);

        let fused = engine(60.0, 5).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);
        let five = score_of(&fused, 5).unwrap();
        let six = score_of(&fused, 6).unwrap();
        let seven = score_of(&fused, 7).unwrap();

        assert!(five > six);
        assert!(five > seven);
        assert!(1.0 / 61.0 > 1.0 / 62.0);
    }

    #[test]
    fn test_multiple_lists_score_at_least_single() {
        let semantic = RankedList::from_ids([1, 2, 3]);
        let keyword = RankedList::from_ids([3]);

        let single = engine(60.0, 5).fuse(&[("semantic", &semantic)]);
        let both = engine(60.0, 5).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);

        for id in [1, 2, 3] {
            assert!(score_of(&both, id).unwrap() >= score_of(&single, id).unwrap());
        }
    }

    #[test]
    fn test_idempotent() {
        let semantic = RankedList::from_ids([4, 8, 15, 16, 23, 42]);
        let keyword = RankedList::from_ids([42, 4, 99]);
        let engine = engine(60.0, 5);

        let first = engine.fuse(&[("semantic", &semantic), ("keyword", &keyword)]);
        let second = engine.fuse(&[("semantic", &semantic), ("keyword", &keyword)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        // 9 and 3 both sit at rank 1 in one list each
        let semantic = RankedList::from_ids([9]);
        let keyword = RankedList::from_ids([3]);

        let fused = engine(60.0, 5).fuse(&[("semantic", &semantic), ("keyword", &keyword)]);
        let ids: Vec<_> = fused.iter().map(|r| r.document_id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn test_large_k_flattens_scores() {
        let semantic = RankedList::from_ids([1, 2, 3]);
        let fused = engine(1e9, 5).fuse(&[("semantic", &semantic)]);

        let spread = fused[0].score - fused[2].score;
        assert!(spread > 0.0);
        assert!(spread < 1e-17);
        assert!(fused.iter().all(|r| r.score < 1e-8));
    }

    #[test]
    fn test_small_k_amplifies_top_rank() {
        let semantic = RankedList::from_ids([1, 2]);
        let small = engine(0.01, 5).fuse(&[("semantic", &semantic)]);
        let default = engine(60.0, 5).fuse(&[("semantic", &semantic)]);

        let small_ratio = small[0].score / small[1].score;
        let default_ratio = default[0].score / default[1].score;
        assert!(small_ratio > 1.9);
        assert!(default_ratio < 1.02);
    }

    #[test]
    fn test_invalid_params() {
        for k in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = FusionParams {
                k,
                ..FusionParams::default()
            };
            assert!(matches!(
                RankFusionEngine::new(params),
                Err(SearchError::InvalidConfiguration(_))
            ));
        }

        let params = FusionParams {
            result_limit: 0,
            ..FusionParams::default()
        };
        assert!(matches!(
            reciprocal_rank_fusion(&[], &params),
            Err(SearchError::InvalidConfiguration(_))
        ));

        let params = FusionParams {
            list_limit: 0,
            ..FusionParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RankFusionEngine>();
    }

    #[test]
    fn test_ranked_list_dedup() {
        let list = RankedList::from_ids([7, 3, 7, 1, 3]);
        assert_eq!(list.ids(), &[7, 3, 1]);
        assert_eq!(list.rank_of(1), Some(3));
        assert_eq!(list.rank_of(42), None);

        let collected: RankedList = vec![2, 2, 5].into_iter().collect();
        assert_eq!(collected.len(), 2);
    }
}
