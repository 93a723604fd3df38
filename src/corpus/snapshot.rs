//! Immutable corpus snapshot shared across requests

use std::collections::HashMap;

use crate::corpus::{InteractionIndex, VocabularyIndex};
use crate::model::{DrugId, RegulatoryChunk};

/// A regulatory chunk plus its optional precomputed embedding.
#[derive(Debug, Clone)]
pub struct PassageEntry {
    pub chunk: RegulatoryChunk,
    pub embedding: Option<Vec<f32>>,
}

/// Everything loaded from the static corpus files. Built once, then shared
/// read-only behind an `Arc`; reload constructs a new snapshot rather than
/// mutating this one.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    pub vocabulary: VocabularyIndex,
    pub interactions: InteractionIndex,
    /// Precomputed drug embeddings for the in-memory vector store
    pub drug_vectors: HashMap<DrugId, Vec<f32>>,
    /// Regulatory passages for the in-memory RAG store
    pub passages: Vec<PassageEntry>,
}
