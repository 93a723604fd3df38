use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

const ENV_CONFIG_PATH: &str = "PHARMA_INTEL_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Retrieval thresholds and result limits
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for an alternative drug to be reported
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Minimum Jaro-Winkler score for a fuzzy vocabulary match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Classifications below this confidence fall back to general_query
    #[serde(default = "default_intent_confidence_threshold")]
    pub intent_confidence_threshold: f64,
    /// Maximum similar drugs / passages returned per request
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_similarity_threshold() -> f32 {
    0.35
}

fn default_fuzzy_threshold() -> f64 {
    0.84
}

fn default_intent_confidence_threshold() -> f64 {
    0.5
}

fn default_max_results() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            intent_confidence_threshold: default_intent_confidence_threshold(),
            max_results: default_max_results(),
        }
    }
}

/// Deadlines in milliseconds. Every external call runs under one of these.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Per data-provider call (graph lookup, vector search, embedding)
    #[serde(default = "default_provider_ms")]
    pub provider_ms: u64,
    /// Whole-request deadline
    #[serde(default = "default_request_ms")]
    pub request_ms: u64,
    /// LLM phrasing of the finalized payload
    #[serde(default = "default_phrasing_ms")]
    pub phrasing_ms: u64,
}

fn default_provider_ms() -> u64 {
    3_000
}

fn default_request_ms() -> u64 {
    15_000
}

fn default_phrasing_ms() -> u64 {
    8_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_ms: default_provider_ms(),
            request_ms: default_request_ms(),
            phrasing_ms: default_phrasing_ms(),
        }
    }
}

/// Paths to the static corpus files loaded at startup
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    /// TSV interaction corpus: drug_a_id, drug_a_name, drug_b_id, drug_b_name,
    /// description and an optional trailing severity column
    #[serde(default = "default_interactions_path")]
    pub interactions_path: String,
    /// Optional TSV of extra synonyms: drug_id, synonym
    #[serde(default)]
    pub synonyms_path: Option<String>,
    /// Optional JSONL of regulatory chunks (id, citation, text, optional embedding)
    #[serde(default)]
    pub regulatory_path: Option<String>,
    /// Optional JSONL of drug embedding vectors for the in-memory vector store
    #[serde(default)]
    pub drug_embeddings_path: Option<String>,
}

fn default_interactions_path() -> String {
    "corpus/ddi.tsv".to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            interactions_path: default_interactions_path(),
            synonyms_path: None,
            regulatory_path: None,
            drug_embeddings_path: None,
        }
    }
}

/// Optional external data providers. When a URL is absent the service falls
/// back to the in-memory snapshot stores.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Neo4j HTTP transaction endpoint, e.g.
    /// `http://localhost:7474/db/neo4j/tx/commit`
    #[serde(default)]
    pub neo4j_url: Option<Url>,
    /// Qdrant REST base URL
    #[serde(default)]
    pub qdrant_url: Option<Url>,
    /// Text embedding service URL
    #[serde(default)]
    pub embedder_url: Option<Url>,
    /// Qdrant collection holding drug embeddings
    #[serde(default = "default_drug_collection")]
    pub drug_collection: String,
    /// Qdrant collection holding regulatory passage embeddings
    #[serde(default = "default_regulatory_collection")]
    pub regulatory_collection: String,
}

fn default_drug_collection() -> String {
    "drug_embeddings_biobert".to_string()
}

fn default_regulatory_collection() -> String {
    "regulatory_passages".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            neo4j_url: None,
            qdrant_url: None,
            embedder_url: None,
            drug_collection: default_drug_collection(),
            regulatory_collection: default_regulatory_collection(),
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub timeouts: TimeoutConfig,
    pub corpus: CorpusConfig,
    pub providers: ProviderConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            timeouts: TimeoutConfig::default(),
            corpus: CorpusConfig::default(),
            providers: ProviderConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            retrieval: file.retrieval,
            timeouts: file.timeouts,
            corpus: file.corpus,
            providers: file.providers,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
