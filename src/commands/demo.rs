//! Demo command - provision, embed, insert and run one fused query

use anyhow::Result;
use colored::Colorize;

use super::index::DEFAULT_CORPUS;
use super::search::print_results;
use hybrid_search::{AppConfig, SearchEngine};

pub const DEFAULT_QUERY: &str = "growling bear";

/// Run the demo; with `in_memory` the on-disk index at `config.db_path` is left alone.
pub fn run(config: &AppConfig, in_memory: bool, query: &str, json: bool) -> Result<()> {
    let mut engine = if in_memory {
        SearchEngine::in_memory(config)?
    } else {
        SearchEngine::from_config(config)?
    };
    let target = if in_memory {
        "memory".to_string()
    } else {
        config.db_path.display().to_string()
    };

    let corpus: Vec<String> = DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect();
    let stats = engine.index_corpus(&corpus)?;

    if !json {
        let params = engine.fusion_params();
        println!(
            "{} Indexed {} documents into {} (k = {}, {} per ranking)",
            "→".dimmed(),
            stats.indexed,
            target,
            params.k,
            params.list_limit
        );
    }

    let results = engine.search(query)?;
    print_results(query, &results, json)
}
