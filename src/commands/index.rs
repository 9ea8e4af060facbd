//! Index command - embed a corpus and store it

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use hybrid_search::search::vectordb::VectorDB;
use hybrid_search::{AppConfig, SearchEngine};

/// Corpus used when no input file is given
pub const DEFAULT_CORPUS: [&str; 3] = [
    "The dog is barking",
    "The cat is purring",
    "The bear is growling",
];

/// Run index command
pub fn run(config: &AppConfig, input: Option<&Path>, status_only: bool, json: bool) -> Result<()> {
    if status_only {
        return show_status(&config.db_path, json);
    }

    let texts = match input {
        Some(path) => read_corpus(path)?,
        None => DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect(),
    };

    let mut engine = SearchEngine::from_config(config)?;

    if !json {
        println!(
            "{} Embedding {} documents with {}...",
            "→".dimmed(),
            texts.len(),
            config.embedding.provider.to_string().cyan()
        );
    }

    let stats = engine.index_corpus(&texts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "{} Indexed {} documents ({} dimensions) in {:.2}s",
            "✓".green().bold(),
            stats.indexed.to_string().cyan(),
            stats.dimension,
            stats.duration_ms as f64 / 1000.0
        );
        println!(
            "  {} Index saved to: {}",
            "→".dimmed(),
            config.db_path.display()
        );
    }

    Ok(())
}

/// One document per non-empty line
fn read_corpus(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    Ok(parse_corpus(&raw))
}

fn parse_corpus(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Show index status
fn show_status(db_path: &Path, json: bool) -> Result<()> {
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Index not found"
                })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "hybrid index".cyan()
            );
        }
        return Ok(());
    }

    let db = VectorDB::open(db_path)?;
    let stats = db.get_stats()?;
    let file_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "document_count": stats.document_count,
                "dimension": stats.dimension,
                "provider": stats.provider,
                "model": stats.model,
                "file_size_bytes": file_size,
            })
        );
    } else {
        println!("{}", "Index Status".bold());
        println!();
        println!(
            "  {} {} documents indexed",
            "→".dimmed(),
            stats.document_count.to_string().cyan()
        );
        if let Some(dimension) = stats.dimension {
            println!("  {} {} dimensions", "→".dimmed(), dimension);
        }
        if let (Some(provider), Some(model)) = (&stats.provider, &stats.model) {
            println!("  {} Embedded with {} ({})", "→".dimmed(), provider, model);
        }
        println!(
            "  {} Size: {:.2} KB",
            "→".dimmed(),
            file_size as f64 / 1024.0
        );
    }

    Ok(())
}
