//! In-memory providers backed by the corpus snapshot
//!
//! These serve local corpora and tests; the brute-force cosine scan is fine
//! at corpus scale and keeps the trait contract identical to the external
//! stores.

use async_trait::async_trait;

use crate::corpus::CorpusHandle;
use crate::model::{DrugId, InteractionEdge};
use crate::provider::{
    InteractionGraph, PassageHit, ProviderError, SimilarDrug, VectorSearch, NEAR_DUPLICATE_SCORE,
};

/// Interaction graph served from the loaded snapshot.
pub struct SnapshotGraph {
    corpus: CorpusHandle,
}

impl SnapshotGraph {
    pub fn new(corpus: CorpusHandle) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl InteractionGraph for SnapshotGraph {
    async fn lookup_pairs(&self, ids: &[DrugId]) -> Result<Vec<InteractionEdge>, ProviderError> {
        Ok(self.corpus.current().interactions.lookup_pairs(ids))
    }
}

/// Brute-force cosine search over corpus-shipped vectors.
pub struct InMemoryVectorStore {
    corpus: CorpusHandle,
}

impl InMemoryVectorStore {
    pub fn new(corpus: CorpusHandle) -> Self {
        Self { corpus }
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorSearch for InMemoryVectorStore {
    async fn find_similar_drugs(
        &self,
        drug_id: &DrugId,
        k: usize,
    ) -> Result<Vec<SimilarDrug>, ProviderError> {
        let snapshot = self.corpus.current();
        let query = match snapshot.drug_vectors.get(drug_id) {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };

        let mut hits: Vec<SimilarDrug> = snapshot
            .drug_vectors
            .iter()
            .filter(|(id, _)| *id != drug_id)
            .map(|(id, vector)| SimilarDrug {
                id: id.clone(),
                name: snapshot.vocabulary.canonical_name(id),
                score: cosine_similarity(query, vector),
            })
            .filter(|hit| hit.score < NEAR_DUPLICATE_SCORE)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn retrieve_passages(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<PassageHit>, ProviderError> {
        let snapshot = self.corpus.current();

        let mut hits: Vec<PassageHit> = snapshot
            .passages
            .iter()
            .filter_map(|entry| {
                entry.embedding.as_ref().map(|embedding| PassageHit {
                    chunk: entry.chunk.clone(),
                    score: cosine_similarity(query_embedding, embedding),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::snapshot::PassageEntry;
    use crate::corpus::{CorpusSnapshot, VocabularyIndex};
    use crate::model::{DrugRecord, RegulatoryChunk};

    fn store() -> InMemoryVectorStore {
        let mut vocabulary = VocabularyIndex::new();
        for (id, name) in [
            ("DB1", "Aspirin"),
            ("DB2", "Ibuprofen"),
            ("DB3", "Warfarin"),
            ("DB4", "Aspirin-Clone"),
        ] {
            vocabulary
                .insert(DrugRecord {
                    id: DrugId::from(id),
                    name: name.to_string(),
                    synonyms: vec![],
                })
                .unwrap();
        }

        let mut snapshot = CorpusSnapshot {
            vocabulary,
            ..Default::default()
        };
        snapshot
            .drug_vectors
            .insert(DrugId::from("DB1"), vec![1.0, 0.0, 0.0]);
        snapshot
            .drug_vectors
            .insert(DrugId::from("DB2"), vec![0.9, 0.1, 0.0]);
        snapshot
            .drug_vectors
            .insert(DrugId::from("DB3"), vec![0.0, 0.0, 1.0]);
        // Near-duplicate of DB1
        snapshot
            .drug_vectors
            .insert(DrugId::from("DB4"), vec![1.0, 0.001, 0.0]);
        snapshot.passages.push(PassageEntry {
            chunk: RegulatoryChunk {
                id: "s18".to_string(),
                citation: "Act s.18".to_string(),
                text: "Misbranded drugs".to_string(),
            },
            embedding: Some(vec![1.0, 0.0, 0.0]),
        });

        InMemoryVectorStore::new(CorpusHandle::from_snapshot(snapshot))
    }

    #[tokio::test]
    async fn test_similarity_excludes_self_and_near_duplicates() {
        let store = store();
        let hits = store
            .find_similar_drugs(&DrugId::from("DB1"), 5)
            .await
            .unwrap();

        assert!(hits.iter().all(|h| h.id != DrugId::from("DB1")));
        assert!(hits.iter().all(|h| h.id != DrugId::from("DB4")));
        assert_eq!(hits[0].id, DrugId::from("DB2"));
        assert_eq!(hits[0].name, "Ibuprofen");
    }

    #[tokio::test]
    async fn test_highly_similar_distinct_drug_is_still_returned() {
        // 0.99-level similarity between distinct drugs is a strong result,
        // not a duplicate; only near-identical embeddings are dropped
        let store = store();
        let hits = store
            .find_similar_drugs(&DrugId::from("DB1"), 5)
            .await
            .unwrap();

        let ibuprofen = hits
            .iter()
            .find(|h| h.id == DrugId::from("DB2"))
            .expect("highly similar distinct drug missing from results");
        assert!(ibuprofen.score > 0.99);
    }

    #[tokio::test]
    async fn test_unknown_drug_yields_empty_result() {
        let store = store();
        let hits = store
            .find_similar_drugs(&DrugId::from("DB999"), 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_passage_retrieval_ranks_by_cosine() {
        let store = store();
        let hits = store.retrieve_passages(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.citation, "Act s.18");
        assert!(hits[0].score > 0.99);
    }

    #[test]
    fn test_cosine_handles_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
