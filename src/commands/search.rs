//! Search command - hybrid semantic + keyword search

use anyhow::Result;
use colored::Colorize;

use hybrid_search::search::engine::{KEYWORD, SEMANTIC};
use hybrid_search::{AppConfig, SearchEngine, SearchResult};

/// Run hybrid search command
pub fn run(config: &AppConfig, query: &str, json: bool) -> Result<()> {
    let engine = SearchEngine::from_config(config)?;
    let results = engine.search(query)?;
    print_results(query, &results, json)
}

pub fn print_results(query: &str, results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for result in results {
        println!("document: {}, RRF score: {:.6}", result.id, result.score);
        println!("   {}", truncate(&result.content, 100).dimmed());
        println!("   {}", describe_ranks(result).dimmed());
    }

    Ok(())
}

fn describe_ranks(result: &SearchResult) -> String {
    let rank = |name: &str| {
        result
            .ranks
            .get(name)
            .map_or_else(|| "-".to_string(), |r| format!("#{r}"))
    };
    format!("{} {} | {} {}", SEMANTIC, rank(SEMANTIC), KEYWORD, rank(KEYWORD))
}

/// Char-aware truncation for display
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
