//! Mythograph CLI: build and query a semiotic graph stored in SQLite.
//!
//! Usage:
//!   mythograph ingest <records.json> [--db path]
//!   mythograph embed <vectors.json> [--db path]
//!   mythograph resolve [--db path]
//!   mythograph retrieve <query.json> [--seed id=score]... [--json] [--db path]
//!   mythograph stats [--db path]

use clap::{Parser, Subcommand};
use mythograph::ingest::coverage;
use mythograph::storage::NodeFilter;
use mythograph::{
    format_context, EdgeKind, EmbeddingService, ExtractionBatch, GraphStore, HybridRetriever,
    Ingestor, MythographConfig, NodeId, NodeType, OpenStore, Resolver, Seed, SqliteStore,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mythograph", version, about = "Semiotic knowledge graph for cultural artifacts")]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "mythograph=info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an extraction document ({"entities": [...], "relations": [...]})
    Ingest {
        /// JSON file with entity and relation records
        path: PathBuf,
    },
    /// Attach embeddings to nodes of the embeddable type
    Embed {
        /// JSON file: [{"name": "...", "vector": [...]}, ...]
        path: PathBuf,
    },
    /// Merge duplicate nodes
    Resolve,
    /// Retrieve a ranked subgraph for a query embedding
    Retrieve {
        /// JSON file holding the query embedding as an array of numbers
        path: PathBuf,
        /// Seed node as <id>=<score>; repeatable. Without seeds, the
        /// nearest indexed nodes are used.
        #[arg(long = "seed")]
        seeds: Vec<String>,
        /// Print JSON instead of the text context
        #[arg(long)]
        json: bool,
    },
    /// Show node and edge counts and coverage violations
    Stats,
}

/// One line of an embedding file
#[derive(Deserialize)]
struct NamedVector {
    name: String,
    vector: Vec<f32>,
}

/// Get the default database path (~/.local/share/mythograph/mythograph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("mythograph").join("mythograph.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn load_config(path: Option<&Path>) -> Result<MythographConfig, String> {
    match path {
        Some(path) => MythographConfig::load(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => Ok(MythographConfig::default()),
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn parse_seed(raw: &str) -> Result<Seed, String> {
    let (id, score) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("seed '{}' must look like <id>=<score>", raw))?;
    let score: f64 = score
        .parse()
        .map_err(|_| format!("seed '{}' has a non-numeric score", raw))?;
    Ok(Seed::new(NodeId::from_string(id), score))
}

fn cmd_ingest(store: Arc<SqliteStore>, config: &MythographConfig, path: &Path) -> i32 {
    let batch: ExtractionBatch = match read_json(path) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let ingestor = Ingestor::new(store, &config.embedding);
    match ingestor.ingest_batch(&batch) {
        Ok(report) => {
            println!(
                "Nodes: {} created, {} merged. Edges: {} created, {} merged. JointConcepts: {}",
                report.nodes_created,
                report.nodes_merged,
                report.edges_created,
                report.edges_merged,
                report.joint_concepts_created
            );
            for issue in &report.issues {
                println!("  skipped {}: {}", issue.record, issue.issue);
            }
            for violation in &report.coverage {
                println!("  coverage: {}", violation);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_embed(store: Arc<SqliteStore>, config: &MythographConfig, path: &Path) -> i32 {
    let entries: Vec<NamedVector> = match read_json(path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let embeddable = &config.embedding.embeddable_type;
    let mut ids = Vec::with_capacity(entries.len());
    let mut vectors = Vec::with_capacity(entries.len());
    for entry in entries {
        match store.find_node(embeddable, &mythograph::canonical_name(&entry.name)) {
            Ok(Some(node)) => {
                ids.push(node.id);
                vectors.push(entry.vector);
            }
            Ok(None) => println!("  no {} named '{}'", embeddable, entry.name),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    let service = EmbeddingService::new(store, config.embedding.clone());
    match service.upsert_embeddings(&ids, &vectors) {
        Ok(report) => {
            println!("Wrote {} embeddings, skipped {}", report.written, report.skipped.len());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resolve(store: Arc<SqliteStore>, config: &MythographConfig) -> i32 {
    match Resolver::new(store, &config.resolver).resolve() {
        Ok(report) => {
            println!(
                "Exact: {} groups, {} nodes removed",
                report.exact.groups_merged, report.exact.nodes_removed
            );
            match report.fuzzy {
                Some(fuzzy) => println!(
                    "Fuzzy: {} groups, {} nodes removed",
                    fuzzy.groups_merged, fuzzy.nodes_removed
                ),
                None => println!("Fuzzy: skipped"),
            }
            println!(
                "Edges: {} re-pointed, {} folded, {} dropped",
                report.edges_repointed, report.edges_folded, report.edges_dropped
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_retrieve(store: Arc<SqliteStore>, config: &MythographConfig, path: &Path, seeds: &[String], json: bool) -> i32 {
    let embedding: Vec<f32> = match read_json(path) {
        Ok(embedding) => embedding,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let seeds = match seeds.iter().map(|s| parse_seed(s)).collect::<Result<Vec<_>, _>>() {
        Ok(seeds) => seeds,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let retriever = HybridRetriever::new(store, config.retrieval.clone());
    let result = if seeds.is_empty() {
        retriever.retrieve_for_embedding(embedding)
    } else {
        retriever.retrieve(&retriever.query(seeds, embedding))
    };

    match result {
        Ok(subgraph) if json => match subgraph.to_json() {
            Ok(text) => {
                println!("{}", text);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Ok(subgraph) => {
            print!("{}", format_context(&subgraph));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(store: Arc<SqliteStore>) -> i32 {
    let run = || -> Result<(), mythograph::StorageError> {
        println!("{:<20}  {:>7}", "NODE TYPE", "COUNT");
        println!("{}", "-".repeat(29));
        let mut counts: Vec<(NodeType, usize)> = Vec::new();
        for node in store.nodes(&NodeFilter::new())? {
            match counts.iter_mut().find(|(t, _)| *t == node.node_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((node.node_type, 1)),
            }
        }
        for (node_type, count) in &counts {
            println!("{:<20}  {:>7}", node_type.as_str(), count);
        }

        let edges = store.edges()?;
        println!();
        println!("{:<20}  {:>7}", "EDGE KIND", "COUNT");
        println!("{}", "-".repeat(29));
        for kind in EdgeKind::ALL {
            let count = edges.iter().filter(|e| e.kind == kind).count();
            println!("{:<20}  {:>7}", kind.as_str(), count);
        }

        let violations = coverage::check(store.as_ref())?;
        println!();
        println!("Coverage violations: {}", violations.len());
        for violation in violations {
            println!("  {}", violation);
        }
        Ok(())
    };

    match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(cli.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Ingest { path } => cmd_ingest(store, &config, &path),
        Commands::Embed { path } => cmd_embed(store, &config, &path),
        Commands::Resolve => cmd_resolve(store, &config),
        Commands::Retrieve { path, seeds, json } => cmd_retrieve(store, &config, &path, &seeds, json),
        Commands::Stats => cmd_stats(store),
    };
    std::process::exit(code);
}
