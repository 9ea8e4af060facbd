//! Harmonic Token Projection (HTP) embedder
//!
//! Deterministic, training-free embeddings: each token is read as a base-2^16
//! integer, reduced modulo a set of primes, and every residue is projected
//! onto the unit circle. Token vectors are mean-pooled and L2 normalized.
//! See https://arxiv.org/html/2511.20665
//!
//! It has no notion of meaning beyond shared tokens, but needs no network and
//! produces identical vectors on every machine.

use std::f64::consts::PI;

use super::EmbeddingProvider;
use crate::config::LOCAL_MODEL;
use crate::error::{Result, SearchError};

/// Unicode code points considered per token
const MAX_TOKEN_LENGTH: usize = 64;

#[derive(Debug, Clone)]
pub struct HtpEmbedder {
    moduli: Vec<u64>,
}

impl HtpEmbedder {
    /// `dimensions` must be even: two components per modulus.
    pub fn with_dimensions(dimensions: usize) -> Result<Self> {
        if dimensions == 0 || dimensions % 2 != 0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "local embedder needs an even, non-zero dimension (got {dimensions})"
            )));
        }
        Ok(Self {
            moduli: first_primes(dimensions / 2),
        })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dims = self.moduli.len() * 2;
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; dims];
        }

        let mut pooled = vec![0.0f64; dims];
        for token in &tokens {
            let n = token_to_integer(token);
            for (i, &m) in self.moduli.iter().enumerate() {
                let theta = 2.0 * PI * (n % m) as f64 / m as f64;
                pooled[2 * i] += theta.sin();
                pooled[2 * i + 1] += theta.cos();
            }
        }

        let count = tokens.len() as f64;
        for v in &mut pooled {
            *v /= count;
        }

        let norm = pooled.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            pooled.iter().map(|x| (x / norm) as f32).collect()
        } else {
            pooled.iter().map(|&x| x as f32).collect()
        }
    }
}

impl EmbeddingProvider for HtpEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.moduli.len() * 2
    }

    fn name(&self) -> &str {
        "local"
    }

    fn model(&self) -> &str {
        LOCAL_MODEL
    }
}

/// Lowercased words split on whitespace and ASCII punctuation
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// N = Σ u_j * 2^16^(L-j), wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// First `count` primes, pairwise coprime by construction
fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
