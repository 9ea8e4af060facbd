//! Neighbors command - semantic-only nearest documents

use anyhow::Result;
use colored::Colorize;

use hybrid_search::{AppConfig, SearchEngine};

pub fn run(config: &AppConfig, query: &str, limit: usize, json: bool) -> Result<()> {
    let engine = SearchEngine::from_config(config)?;
    let neighbors = engine.nearest(query, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&neighbors)?);
        return Ok(());
    }

    if neighbors.is_empty() {
        println!("{} No documents indexed", "!".yellow());
        return Ok(());
    }

    for neighbor in &neighbors {
        println!("{}", neighbor.content);
    }

    Ok(())
}
