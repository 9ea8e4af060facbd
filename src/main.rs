mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hybrid_search::config::{
    AppConfig, EmbeddingConfig, ProviderKind, DEFAULT_DB_PATH, DEFAULT_TIMEOUT_SECS,
};
use hybrid_search::search::fusion::{
    FusionParams, DEFAULT_K, DEFAULT_LIST_LIMIT, DEFAULT_RESULT_LIMIT,
};

#[derive(Parser)]
#[command(name = "hybrid")]
#[command(about = "Hybrid semantic + keyword search with Reciprocal Rank Fusion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "SQLite database path [default: hybrid-search.db] (demo runs in memory without it)")]
    db: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = ProviderKind::Ollama, help = "Embedding provider")]
    provider: ProviderKind,

    #[arg(long, global = true, help = "Provider endpoint (Ollama host or OpenAI URL)")]
    endpoint: Option<String>,

    #[arg(long, global = true, help = "Embedding model name")]
    model: Option<String>,

    #[arg(long, global = true, help = "Embedding dimensions (must match the model)")]
    dimensions: Option<usize>,

    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true, help = "OpenAI API key")]
    api_key: Option<String>,

    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, help = "HTTP timeout in seconds")]
    timeout: u64,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More logging (-v, -vv)")]
    verbose: u8,

    #[arg(long, global = true, help = "Log as JSON lines on stderr")]
    log_json: bool,
}

#[derive(Args)]
struct FusionArgs {
    #[arg(long, default_value_t = DEFAULT_K, help = "RRF smoothing constant")]
    k: f64,
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT, help = "Entries taken from each ranking")]
    list_limit: usize,
    #[arg(long, short, default_value_t = DEFAULT_RESULT_LIMIT, help = "Limit results")]
    limit: usize,
}

impl FusionArgs {
    fn params(&self) -> FusionParams {
        FusionParams {
            k: self.k,
            list_limit: self.list_limit,
            result_limit: self.limit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index the sample corpus and run one fused query (in memory unless --db is given)
    Demo {
        #[arg(default_value = commands::demo::DEFAULT_QUERY)]
        query: String,
        #[command(flatten)]
        fusion: FusionArgs,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Build the document index (drops any existing one)
    Index {
        #[arg(long, help = "Corpus file, one document per line")]
        input: Option<PathBuf>,
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Hybrid search fused with RRF
    Search {
        query: String,
        #[command(flatten)]
        fusion: FusionArgs,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Semantic-only nearest neighbours
    #[command(alias = "nn")]
    Neighbors {
        query: String,
        #[arg(long, short, default_value_t = DEFAULT_RESULT_LIMIT, help = "Limit results")]
        limit: usize,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match cli.command {
        Commands::Demo { query, fusion, json } => {
            let config = build_config(&cli.global, fusion.params());
            let in_memory = cli.global.db.is_none();
            commands::demo::run(&config, in_memory, &query, json)
        }
        Commands::Index {
            input,
            status,
            json,
        } => {
            let config = build_config(&cli.global, FusionParams::default());
            commands::index::run(&config, input.as_deref(), status, json)
        }
        Commands::Search {
            query,
            fusion,
            json,
        } => {
            let config = build_config(&cli.global, fusion.params());
            commands::search::run(&config, &query, json)
        }
        Commands::Neighbors { query, limit, json } => {
            let config = build_config(&cli.global, FusionParams::default());
            commands::neighbors::run(&config, &query, limit, json)
        }
    }
}

fn build_config(global: &GlobalArgs, fusion: FusionParams) -> AppConfig {
    AppConfig {
        db_path: global
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        embedding: EmbeddingConfig {
            provider: global.provider,
            endpoint: global.endpoint.clone(),
            model: global.model.clone(),
            dimensions: global.dimensions,
            api_key: global.api_key.clone(),
            timeout_secs: global.timeout,
        },
        fusion,
    }
}

fn init_tracing(global: &GlobalArgs) {
    let filter = match global.verbose {
        0 => "warn",
        1 => "info,hybrid_search=debug",
        _ => "debug,hybrid_search=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if global.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "hybrid", "--provider", "local", "--db", "x.db", "search", "bear", "--k", "10", "-l", "3",
        ])
        .unwrap();

        let Commands::Search { query, fusion, .. } = cli.command else {
            panic!("expected search");
        };
        let config = build_config(&cli.global, fusion.params());
        assert_eq!(query, "bear");
        assert_eq!(config.embedding.provider, ProviderKind::Local);
        assert_eq!(config.db_path, PathBuf::from("x.db"));
        assert_eq!(config.fusion.k, 10.0);
        assert_eq!(config.fusion.result_limit, 3);
        assert_eq!(config.fusion.list_limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_db_path_defaults_when_absent() {
        let cli = Cli::try_parse_from(["hybrid", "--provider", "local", "demo"]).unwrap();
        assert!(cli.global.db.is_none());

        let config = build_config(&cli.global, FusionParams::default());
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }
}
