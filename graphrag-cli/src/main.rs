use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::{Context, Result};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graphrag::{load_config, load_requests, replay, ConfigOverrides};
use graphrag_cache::{QueryOptimizer, SharedQueryOptimizer};

#[derive(Parser)]
#[command(name = "graphrag")]
#[command(about = "GraphRAG query optimizer caches", long_about = None)]
struct Cli {
    /// Capacity of the fingerprint cache
    #[arg(long, global = true)]
    max_fingerprint_cache: Option<usize>,

    /// Capacity of the graph type cache
    #[arg(long, global = true)]
    max_type_cache: Option<usize>,

    /// Return signature hits without checking the full query text
    #[arg(long, global = true)]
    trust_signatures: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fingerprint of one request
    Fingerprint {
        /// Request as a JSON object
        request: String,
    },

    /// Print the graph type of one request
    DetectType {
        /// Request as a JSON object
        request: String,
    },

    /// Replay a JSON-lines request log and print cache statistics
    Replay {
        /// File with one JSON request per line
        file: PathBuf,

        /// Number of concurrent workers sharing the optimizer
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn parse_request(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Request is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "graphrag=info,graphrag_cache=info".into())
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        max_fingerprint_cache: cli.max_fingerprint_cache,
        max_type_cache: cli.max_type_cache,
        trust_signatures: cli.trust_signatures,
    };
    let config = load_config(&overrides)?;

    match cli.command {
        Commands::Fingerprint { request } => {
            let request = parse_request(&request)?;
            let mut optimizer = QueryOptimizer::new(config)?;
            println!("{}", optimizer.optimize(&request)?);
        }
        Commands::DetectType { request } => {
            let request = parse_request(&request)?;
            let mut optimizer = QueryOptimizer::new(config)?;
            println!("{}", optimizer.detect_type(&request)?);
        }
        Commands::Replay { file, workers, json } => {
            let input = load_requests(&file)?;
            let optimizer = SharedQueryOptimizer::new(config)?;
            let report = replay(optimizer, input, workers).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
