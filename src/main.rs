//! CLI entry point for docluster.
//!
//! Provides commands for searching a text corpus and writing cluster reports.
//! Main components: Cli parser, Commands enum, and per-command runners.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use docluster::config::{ClusteringConfig, EngineKind};
use docluster::display::{Status, THEME, create_cluster_table, create_results_table};
use docluster::io::{ExitCode, read_corpus};
use docluster::search::{ClusteringSearchEngine, VectorDbEngine};
use docluster::{DocumentVectorDb, RetrievalError, Settings};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Document retrieval over BM25 vectors
#[derive(Parser)]
#[command(
    name = "docluster",
    version = env!("CARGO_PKG_VERSION"),
    about = "Document retrieval over BM25 vectors with k-means accelerated search",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug information to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .docluster directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "Retrieve the documents closest to a query")]
    Search {
        /// Query text
        query: String,

        /// Text file with one document per line
        #[arg(long)]
        corpus: PathBuf,

        /// Number of documents to return
        #[arg(short, long)]
        n: Option<usize>,

        /// Retrieval strategy
        #[arg(long, value_enum)]
        engine: Option<EngineKind>,

        /// Number of k-means clusters for the clustering engine
        #[arg(long)]
        clusters: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Train k-means over a corpus and write a cluster report")]
    Report {
        /// Text file with one document per line
        #[arg(long)]
        corpus: PathBuf,

        /// Where to write the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Example documents per cluster
        #[arg(long)]
        examples: Option<usize>,

        /// Number of k-means clusters
        #[arg(long)]
        clusters: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct SearchHit<'a> {
    rank: usize,
    distance: f64,
    document: &'a str,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "{}",
                THEME.status(Status::Error, &format!("Configuration error: {e}"))
            );
            return ExitCode::ConfigError.into();
        }
    };

    init_tracing(cli.debug || settings.debug);

    let result = match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Config => run_config(&settings),
        Commands::Search {
            query,
            corpus,
            n,
            engine,
            clusters,
            json,
        } => run_search(&settings, &query, &corpus, n, engine, clusters, json),
        Commands::Report {
            corpus,
            output,
            examples,
            clusters,
        } => run_report(&settings, &corpus, output, examples, clusters),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", THEME.status(Status::Error, &format!("{e:#}")));
            if let Some(retrieval) = e.downcast_ref::<RetrievalError>() {
                for suggestion in retrieval.recovery_suggestions() {
                    eprintln!("  {}", THEME.hint(suggestion));
                }
            }
            ExitCode::from_anyhow(&e)
        }
    };
    tracing::debug!("Exiting with code {}: {}", i32::from(code), code.description());
    code.into()
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_init(force: bool) -> anyhow::Result<ExitCode> {
    match Settings::init_config_file(force) {
        Ok(_) => {
            println!("Edit this file to customize your settings.");
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!("{}", THEME.status(Status::Error, &e.to_string()));
            Ok(ExitCode::ConfigError)
        }
    }
}

fn run_config(settings: &Settings) -> anyhow::Result<ExitCode> {
    println!("{}", THEME.header("Current Configuration:"));
    println!("{}", "=".repeat(50));
    match toml::to_string_pretty(settings) {
        Ok(toml_str) => {
            println!("{toml_str}");
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!(
                "{}",
                THEME.status(Status::Error, &format!("Error displaying config: {e}"))
            );
            Ok(ExitCode::ConfigError)
        }
    }
}

/// Read the corpus file and ingest it with the configured stop words and
/// BM25 parameters.
fn load_db(settings: &Settings, corpus: &Path) -> anyhow::Result<DocumentVectorDb> {
    let documents = read_corpus(corpus)?;
    let stop_words = settings.stop_words()?;
    let mut db = DocumentVectorDb::with_bm25_params(stop_words, settings.bm25.into())?;
    db.put_corpus(&documents).context("Failed to ingest corpus")?;
    Ok(db)
}

fn clustering_config(settings: &Settings, clusters: Option<usize>) -> ClusteringConfig {
    ClusteringConfig {
        n_clusters: clusters.unwrap_or(settings.clustering.n_clusters),
        ..settings.clustering
    }
}

fn run_search(
    settings: &Settings,
    query: &str,
    corpus: &Path,
    n: Option<usize>,
    engine: Option<EngineKind>,
    clusters: Option<usize>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let db = load_db(settings, corpus)?;
    let kind = engine.unwrap_or(settings.search.engine);
    let n_neighbours = n.unwrap_or(settings.search.n_neighbours);

    let mut engine = VectorDbEngine::from_kind(&db, kind, &clustering_config(settings, clusters))
        .context("Failed to build search engine")?;
    let results = engine.retrieve_relevant_documents(query, n_neighbours)?;

    if json {
        let hits: Vec<SearchHit> = results
            .iter()
            .enumerate()
            .map(|(rank, (distance, document))| SearchHit {
                rank: rank + 1,
                distance: *distance,
                document,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if results.is_empty() {
        println!(
            "{}",
            THEME.status(Status::Warning, "No documents matched the query")
        );
    } else {
        println!("{}", create_results_table(&results));
        if let Some((closest, _)) = results.first() {
            println!(
                "{} of {} requested documents, closest at distance {}",
                THEME.count(results.len()),
                THEME.count(n_neighbours),
                THEME.distance(*closest)
            );
        }
    }

    Ok(ExitCode::from_results(&results))
}

fn run_report(
    settings: &Settings,
    corpus: &Path,
    output: Option<PathBuf>,
    examples: Option<usize>,
    clusters: Option<usize>,
) -> anyhow::Result<ExitCode> {
    let db = load_db(settings, corpus)?;
    let output = output.unwrap_or_else(|| settings.report.output_path.clone());
    let num_examples = examples.unwrap_or(settings.report.num_examples);

    let mut engine = ClusteringSearchEngine::with_config(&db, &clustering_config(settings, clusters))?;
    let outcome = engine.train()?;
    let info = engine.make_report(num_examples, &output)?;
    let square_sum = engine.calculate_square_sum()?;

    println!("{}", create_cluster_table(&info));
    println!("{}", THEME.training(outcome));
    println!("Sum of squared errors: {}", THEME.square_sum(square_sum));
    println!(
        "{} {}",
        THEME.status(Status::Success, "Report written to"),
        THEME.path(&output)
    );
    if engine.kmeans().get_clusters().len() < engine.kmeans().n_clusters() {
        println!(
            "{}",
            THEME.status(Status::Warning, &format!(
                "Only {} of {} requested clusters could be seeded",
                engine.kmeans().get_clusters().len(),
                engine.kmeans().n_clusters()
            ))
        );
    }
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "docluster",
            "search",
            "cat",
            "--corpus",
            "corpus.txt",
            "-n",
            "2",
            "--engine",
            "advanced",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                query, n, engine, ..
            } => {
                assert_eq!(query, "cat");
                assert_eq!(n, Some(2));
                assert_eq!(engine, Some(EngineKind::Advanced));
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_clustering_override() {
        let settings = Settings::default();
        assert_eq!(clustering_config(&settings, Some(5)).n_clusters, 5);
        assert_eq!(clustering_config(&settings, None).n_clusters, 3);
    }
}
