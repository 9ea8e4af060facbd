//! Document store using SQLite
//!
//! Stores embeddings as little-endian f32 BLOBs and computes cosine distance
//! in Rust. Keyword relevance comes from an FTS5 index kept in step with the
//! `documents` table.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use super::fusion::{DocumentId, RankedList};
use super::sources::{KeywordRankSource, VectorRankSource};
use crate::error::{Result, SearchError};

const META_DIMENSION: &str = "dimension";
pub const META_PROVIDER: &str = "provider";
pub const META_MODEL: &str = "model";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    -- Full-text index over content (external content, no copy of the text)
    CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
        content,
        content = 'documents',
        content_rowid = 'id',
        tokenize = 'porter unicode61'
    );

    CREATE TABLE IF NOT EXISTS index_meta (
        key TEXT PRIMARY KEY,
        value TEXT
    );
"#;

/// Common English words left out of keyword queries, as the `english`
/// text-search configuration does.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// SQLite-backed store serving both vector and keyword rankings
pub struct VectorDB {
    conn: Connection,
}

impl VectorDB {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open in-memory database
    ///
    /// Used by tests and by `demo` when no `--db` path is given.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Drop and recreate the document tables for embeddings of `dimension`.
    pub fn reset(&mut self, dimension: usize) -> Result<()> {
        self.replace_corpus(dimension, &[], &[])?;
        Ok(())
    }

    /// Swap the whole corpus for `docs`, returning their assigned ids in order.
    ///
    /// Dropping the tables, writing `meta` and inserting run in one
    /// transaction: on any error the previous corpus and metadata remain.
    pub fn replace_corpus(
        &mut self,
        dimension: usize,
        meta: &[(&str, &str)],
        docs: &[(String, Vec<f32>)],
    ) -> Result<Vec<DocumentId>> {
        if dimension == 0 {
            return Err(SearchError::InvalidConfiguration(
                "embedding dimension must be > 0".to_string(),
            ));
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            DROP TABLE IF EXISTS documents_fts;
            DROP TABLE IF EXISTS documents;
            DELETE FROM index_meta;
            "#,
        )?;
        tx.execute_batch(SCHEMA)?;
        write_meta(&tx, META_DIMENSION, &dimension.to_string())?;
        for (key, value) in meta {
            write_meta(&tx, key, value)?;
        }
        let ids = insert_rows(&tx, dimension, docs)?;
        tx.commit()?;

        info!(dimension, documents = ids.len(), "Recreated documents table");
        Ok(ids)
    }

    /// Append documents in one transaction, returning their assigned ids in order.
    ///
    /// Every embedding must match the stored dimension; nothing is written
    /// if any of them does not.
    pub fn insert_documents(&mut self, docs: &[(String, Vec<f32>)]) -> Result<Vec<DocumentId>> {
        let dimension = self.dimension()?.ok_or_else(|| {
            SearchError::InvalidConfiguration(
                "documents table has no dimension; reset it first".to_string(),
            )
        })?;

        let tx = self.conn.transaction()?;
        let ids = insert_rows(&tx, dimension, docs)?;
        tx.commit()?;

        debug!(count = ids.len(), "Inserted documents");
        Ok(ids)
    }

    /// Get document by ID
    pub fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                "SELECT id, content, embedding FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    let blob: Vec<u8> = row.get(2)?;
                    Ok(Document {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        embedding: blob_to_embedding(&blob),
                    })
                },
            )
            .optional()?;

        Ok(doc)
    }

    /// Closest documents to `query` by cosine distance, ascending.
    ///
    /// Equal distances fall back to ascending id.
    pub fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<(Document, f32)>> {
        let Some(dimension) = self.dimension()? else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        // Full scan; fine for small corpora
        let mut stmt = self
            .conn
            .prepare("SELECT id, content, embedding FROM documents")?;
        let rows = stmt.query_map([], |row| {
            let blob: Vec<u8> = row.get(2)?;
            Ok(Document {
                id: row.get(0)?,
                content: row.get(1)?,
                embedding: blob_to_embedding(&blob),
            })
        })?;

        let mut results: Vec<(Document, f32)> = Vec::new();
        for row in rows {
            let doc = row?;
            let distance = cosine_distance(query, &doc.embedding);
            results.push((doc, distance));
        }

        results.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        results.truncate(limit);

        Ok(results)
    }

    /// Index statistics
    pub fn get_stats(&self) -> Result<IndexStats> {
        let document_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        Ok(IndexStats {
            document_count: document_count as usize,
            dimension: self.dimension()?,
            provider: self.get_meta(META_PROVIDER)?,
            model: self.get_meta(META_MODEL)?,
        })
    }

    /// Embedding dimension fixed at the last reset
    pub fn dimension(&self) -> Result<Option<usize>> {
        match self.get_meta(META_DIMENSION)? {
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                SearchError::InvalidConfiguration(format!("stored dimension is not a number: {raw}"))
            }),
            None => Ok(None),
        }
    }

    /// Set index metadata
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        write_meta(&self.conn, key, value)
    }

    /// Get index metadata
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl VectorRankSource for VectorDB {
    fn rank_by_vector(&self, query: &[f32], limit: usize) -> Result<RankedList> {
        let nearest = self.nearest(query, limit)?;
        Ok(nearest.into_iter().map(|(doc, _)| doc.id).collect())
    }
}

impl KeywordRankSource for VectorDB {
    fn rank_by_keyword(&self, query: &str, limit: usize) -> Result<RankedList> {
        let Some(expr) = fts_query(query) else {
            return Ok(RankedList::default());
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT rowid FROM documents_fts
            WHERE documents_fts MATCH ?1
            ORDER BY bm25(documents_fts), rowid
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![expr, limit as i64], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        debug!(query, matches = ids.len(), "Keyword ranking");
        Ok(RankedList::from_ids(ids))
    }
}

/// Index statistics
#[derive(Debug)]
pub struct IndexStats {
    pub document_count: usize,
    pub dimension: Option<usize>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Insert rows into `documents` and the FTS index on an open transaction.
fn insert_rows(
    conn: &Connection,
    dimension: usize,
    docs: &[(String, Vec<f32>)],
) -> Result<Vec<DocumentId>> {
    let mut insert_doc = conn.prepare("INSERT INTO documents (content, embedding) VALUES (?1, ?2)")?;
    let mut insert_fts =
        conn.prepare("INSERT INTO documents_fts (rowid, content) VALUES (?1, ?2)")?;

    let mut ids = Vec::with_capacity(docs.len());
    for (content, embedding) in docs {
        if embedding.len() != dimension {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: embedding.len(),
            });
        }
        insert_doc.execute(params![content, embedding_to_blob(embedding)])?;
        let id = conn.last_insert_rowid();
        insert_fts.execute(params![id, content])?;
        ids.push(id);
    }
    Ok(ids)
}

/// Turn free text into an FTS5 expression requiring every non-stop-word term.
///
/// Terms are quoted so user input can never reach FTS5 operator syntax.
fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .filter(|term| !STOP_WORDS.contains(&term.as_str()))
        .map(|term| format!("\"{term}\""))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}

/// Cosine distance in [0, 2]; zero-norm vectors are treated as orthogonal
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
