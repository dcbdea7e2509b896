//! Configuration module for docluster.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCLUSTER_` and use double
//! underscores to separate nested levels:
//! - `DOCLUSTER_CLUSTERING__N_CLUSTERS=5` sets `clustering.n_clusters`
//! - `DOCLUSTER_SEARCH__ENGINE=tree` sets `search.engine`
//! - `DOCLUSTER_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RetrievalError, RetrievalResult};
use crate::text::Bm25Params;

/// Directory holding the settings file, searched from the current directory
/// upwards.
pub const CONFIG_DIR: &str = ".docluster";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Verbose logging
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Corpus preprocessing
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// BM25 weighting parameters
    #[serde(default)]
    pub bm25: Bm25Config,

    /// K-means training
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Retrieval defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Cluster report output
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorpusConfig {
    /// Inline stop words
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// File with one stop word per line, merged with `stop_words`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_words_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Bm25Config {
    /// Term frequency saturation
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// Document length normalization
    #[serde(default = "default_b")]
    pub b: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ClusteringConfig {
    /// Number of clusters (k)
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,

    /// Maximum centroid movement still considered converged
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Upper bound on training iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// Retrieval strategy selectable from configuration and the CLI.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Exact scan over the database vectors
    Basic,
    /// Single nearest neighbour through a naive KD-tree
    Tree,
    /// k nearest neighbours through a pruning KD-tree
    Advanced,
    /// Search restricted to the nearest k-means cluster
    Clustering,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Default retrieval strategy
    #[serde(default = "default_engine")]
    pub engine: EngineKind,

    /// Default number of documents returned
    #[serde(default = "default_n_neighbours")]
    pub n_neighbours: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReportConfig {
    /// Example documents listed per cluster
    #[serde(default = "default_num_examples")]
    pub num_examples: usize,

    /// Where the JSON report is written
    #[serde(default = "default_report_path")]
    pub output_path: PathBuf,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_k1() -> f64 {
    crate::text::bm25::DEFAULT_K1
}
fn default_b() -> f64 {
    crate::text::bm25::DEFAULT_B
}
fn default_n_clusters() -> usize {
    3
}
fn default_convergence_threshold() -> f64 {
    1e-7
}
fn default_max_iterations() -> usize {
    300
}
fn default_engine() -> EngineKind {
    EngineKind::Clustering
}
fn default_n_neighbours() -> usize {
    3
}
fn default_num_examples() -> usize {
    3
}
fn default_report_path() -> PathBuf {
    PathBuf::from("cluster_report.json")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            corpus: CorpusConfig::default(),
            bm25: Bm25Config::default(),
            clustering: ClusteringConfig::default(),
            search: SearchConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

impl From<Bm25Config> for Bm25Params {
    fn from(config: Bm25Config) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: default_n_clusters(),
            convergence_threshold: default_convergence_threshold(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl ClusteringConfig {
    /// Default settings with a different cluster count.
    #[must_use]
    pub fn with_clusters(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Self::default()
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            n_neighbours: default_n_neighbours(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            num_examples: default_num_examples(),
            output_path: default_report_path(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring environment
    /// overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let settings: Self = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore becomes a nesting dot, single underscores stay
            .merge(Env::prefixed("DOCLUSTER_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)?;

        Bm25Params::from(settings.bm25)
            .validate()
            .map_err(|e| Box::new(figment::Error::from(format!("[bm25] {e}"))))?;
        Ok(settings)
    }

    /// Find the settings file by looking for a `.docluster` directory from
    /// the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// All stop words: inline ones plus the contents of `stop_words_path`.
    pub fn stop_words(&self) -> RetrievalResult<Vec<String>> {
        let mut words = self.corpus.stop_words.clone();
        if let Some(path) = &self.corpus.stop_words_path {
            let content = std::fs::read_to_string(path).map_err(|e| {
                RetrievalError::invalid_argument(format!(
                    "cannot read stop words from '{}': {e}",
                    path.display()
                ))
            })?;
            words.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|word| !word.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(words)
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# docluster configuration file

# Version of the configuration schema
version = 1

# Verbose logging to stderr
debug = false

[corpus]
# Words removed by the tokenizer
stop_words = ["a", "an", "and", "in", "of", "on", "the", "to"]

# Optional file with one stop word per line (merged with the list above)
# stop_words_path = "stop_words.txt"

[bm25]
k1 = 1.5
b = 0.75

[clustering]
# Number of k-means clusters
n_clusters = 3

# Centroid movement at or below which training stops
convergence_threshold = 1e-7

# Hard cap on training iterations
max_iterations = 300

[search]
# basic | tree | advanced | clustering
engine = "clustering"
n_neighbours = 3

[report]
num_examples = 3
output_path = "cluster_report.json"
"#;

        std::fs::write(&config_path, template)?;

        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
        }

        Ok(config_path)
    }
}
