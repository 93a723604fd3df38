//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;
use std::time::Duration;

use crate::corpus::{CorpusError, CorpusHandle};
use crate::model::Config;
use crate::provider::{
    HttpEmbedder, InMemoryVectorStore, InteractionGraph, Neo4jGraphProvider, QdrantVectorProvider,
    SnapshotGraph, TextEmbedder, VectorSearch,
};
use crate::service::{
    EntityExtractionService, IntentClassificationService, InteractionCache, LlmClient,
    PhrasingService, QueryService,
};

/// Application state containing all services and shared resources
///
/// This struct centralizes service initialization and makes it easy to inject
/// dependencies into Actix-web handlers.
pub struct AppState {
    /// Shared corpus snapshot handle
    pub corpus: CorpusHandle,
    /// Redis cache (optional)
    pub cache: Option<InteractionCache>,
    /// Query orchestration service
    pub query_service: Arc<QueryService>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Corpus loading and integrity checks (fatal on failure)
    /// 2. Redis cache initialization (optional)
    /// 3. LLM client initialization (optional, from OPENAI_API_KEY)
    /// 4. Data provider selection and service graph construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // The corpus is the one hard dependency. An unloadable or
        // inconsistent corpus refuses to serve.
        let corpus = CorpusHandle::load(&config.corpus)?;

        // Initialize Redis cache (optional - will log warning if Redis is unavailable)
        let cache = match InteractionCache::new().await {
            Ok(cache) => {
                tracing::info!("Redis cache enabled");
                Some(cache)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis cache unavailable, running without cache");
                None
            }
        };

        // The language model is optional: extraction and classification have
        // deterministic paths, and without it responses simply carry no
        // phrased answer.
        let llm_client = LlmClient::from_env();
        if llm_client.is_none() {
            tracing::info!("No LLM configured, running with deterministic pipeline only");
        }

        let provider_timeout = Duration::from_millis(config.timeouts.provider_ms);

        let graph: Arc<dyn InteractionGraph> = match &config.providers.neo4j_url {
            Some(url) => {
                tracing::info!(url = %url, "Using Neo4j interaction graph");
                Arc::new(Neo4jGraphProvider::new(url.to_string(), provider_timeout))
            }
            None => Arc::new(SnapshotGraph::new(corpus.clone())),
        };

        let vectors: Arc<dyn VectorSearch> = match &config.providers.qdrant_url {
            Some(url) => {
                tracing::info!(url = %url, "Using Qdrant vector search");
                Arc::new(QdrantVectorProvider::new(
                    url.to_string(),
                    config.providers.drug_collection.clone(),
                    config.providers.regulatory_collection.clone(),
                    provider_timeout,
                ))
            }
            None => Arc::new(InMemoryVectorStore::new(corpus.clone())),
        };

        let embedder: Option<Arc<dyn TextEmbedder>> =
            config.providers.embedder_url.as_ref().map(|url| {
                Arc::new(HttpEmbedder::new(url.to_string(), provider_timeout))
                    as Arc<dyn TextEmbedder>
            });

        let extraction = EntityExtractionService::new(
            corpus.clone(),
            config.retrieval.fuzzy_threshold,
            llm_client.clone(),
        );
        let intent = IntentClassificationService::new(
            config.retrieval.intent_confidence_threshold,
            llm_client.clone(),
        );
        let phrasing = llm_client.map(PhrasingService::new);

        let query_service = Arc::new(QueryService::new(
            corpus.clone(),
            extraction,
            intent,
            graph,
            vectors,
            embedder,
            phrasing,
            cache.clone(),
            config.retrieval.clone(),
            config.timeouts.clone(),
        ));

        Ok(Self {
            corpus,
            cache,
            query_service,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Corpus loading or integrity check failed
    #[error("Corpus initialization failed: {0}")]
    CorpusInit(#[from] CorpusError),
}
