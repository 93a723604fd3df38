//! Data provider abstractions
//!
//! The orchestrator reaches the interaction graph, vector stores, and the
//! embedding service only through these traits, so retrieval can run against
//! the in-memory snapshot, external services, or test fakes interchangeably.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{DrugId, InteractionEdge, RegulatoryChunk};

pub mod embedding;
pub mod memory;
pub mod neo4j;
pub mod qdrant;

pub use embedding::HttpEmbedder;
pub use memory::{InMemoryVectorStore, SnapshotGraph};
pub use neo4j::Neo4jGraphProvider;
pub use qdrant::QdrantVectorProvider;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("Provider call timed out")]
    Timeout,

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

/// A drug ranked by embedding similarity to the query drug. Serializable so
/// alternative lists can be cached by canonical drug id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarDrug {
    pub id: DrugId,
    pub name: String,
    pub score: f32,
}

/// A regulatory passage ranked by similarity to the query embedding.
#[derive(Debug, Clone)]
pub struct PassageHit {
    pub chunk: RegulatoryChunk,
    pub score: f32,
}

/// Read-only access to the drug-drug interaction graph.
#[async_trait]
pub trait InteractionGraph: Send + Sync {
    /// Recorded edges among every unordered pair of `ids`. Symmetric:
    /// argument order never changes the result. Absent pairs are simply not
    /// returned; the synthesizer reports them as unrecorded.
    async fn lookup_pairs(&self, ids: &[DrugId]) -> Result<Vec<InteractionEdge>, ProviderError>;
}

/// Read-only semantic search over the drug and regulatory namespaces.
///
/// Implementations exclude the query drug itself and near-duplicates
/// (score >= 0.999) from similarity results; the caller applies the
/// configured similarity threshold.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn find_similar_drugs(
        &self,
        drug_id: &DrugId,
        k: usize,
    ) -> Result<Vec<SimilarDrug>, ProviderError>;

    async fn retrieve_passages(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<PassageHit>, ProviderError>;
}

/// Produces query embeddings for passage retrieval.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Similarity at or above which a hit is treated as the query drug itself
/// under a different label. Distinct drugs can legitimately score 0.99
/// against each other; only an essentially identical embedding is dropped.
pub(crate) const NEAR_DUPLICATE_SCORE: f32 = 0.999;
