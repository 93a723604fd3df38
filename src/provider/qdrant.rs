//! Qdrant-backed vector search
//!
//! REST client over two collections: drug embeddings and regulatory
//! passages. Drug similarity first scrolls for the query drug's stored
//! vector, then searches with it, mirroring the lookup the original
//! embedding pipeline indexed for.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::model::{DrugId, RegulatoryChunk};
use crate::provider::{
    PassageHit, ProviderError, SimilarDrug, VectorSearch, NEAR_DUPLICATE_SCORE,
};

/// Extra hits fetched beyond `k` so self/near-duplicate filtering still
/// leaves enough results.
const OVERFETCH: usize = 3;

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<ScrolledPoint>,
}

#[derive(Debug, Deserialize)]
struct ScrolledPoint {
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Option<serde_json::Value>,
}

/// Client for a Qdrant instance holding the embedding collections.
pub struct QdrantVectorProvider {
    client: Client,
    base_url: String,
    drug_collection: String,
    regulatory_collection: String,
}

impl QdrantVectorProvider {
    pub fn new(
        base_url: String,
        drug_collection: String,
        regulatory_collection: String,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            drug_collection,
            regulatory_collection,
        }
    }

    fn map_send_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e)
        }
    }

    /// Fetch the stored vector for a drug via a filtered scroll.
    async fn drug_vector(&self, drug_id: &DrugId) -> Result<Option<Vec<f32>>, ProviderError> {
        let url = format!(
            "{}/collections/{}/points/scroll",
            self.base_url, self.drug_collection
        );
        let body = json!({
            "filter": {
                "must": [{ "key": "drug_id", "match": { "value": drug_id.as_str() } }]
            },
            "limit": 1,
            "with_vector": true
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Qdrant scroll returned status {}",
                response.status()
            )));
        }

        let scroll: ScrollResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(scroll.result.points.into_iter().find_map(|p| p.vector))
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, ProviderError> {
        let url = format!("{}/collections/{}/points/search", self.base_url, collection);
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Qdrant search returned status {}",
                response.status()
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(search.result)
    }
}

fn payload_str(payload: &Option<serde_json::Value>, key: &str) -> Option<String> {
    payload
        .as_ref()
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[async_trait]
impl VectorSearch for QdrantVectorProvider {
    async fn find_similar_drugs(
        &self,
        drug_id: &DrugId,
        k: usize,
    ) -> Result<Vec<SimilarDrug>, ProviderError> {
        let vector = match self.drug_vector(drug_id).await? {
            Some(v) => v,
            None => {
                tracing::debug!(drug_id = %drug_id, "No stored embedding for drug");
                return Ok(Vec::new());
            }
        };

        let points = self
            .search(&self.drug_collection, &vector, k + OVERFETCH)
            .await?;

        let mut hits = Vec::new();
        for point in points {
            let id = match payload_str(&point.payload, "drug_id") {
                Some(id) => DrugId::new(id),
                None => continue,
            };
            if &id == drug_id || point.score >= NEAR_DUPLICATE_SCORE {
                continue;
            }
            let name = payload_str(&point.payload, "name").unwrap_or_else(|| id.to_string());
            hits.push(SimilarDrug {
                id,
                name,
                score: point.score,
            });
            if hits.len() == k {
                break;
            }
        }

        Ok(hits)
    }

    async fn retrieve_passages(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<PassageHit>, ProviderError> {
        let points = self
            .search(&self.regulatory_collection, query_embedding, k)
            .await?;

        let hits = points
            .into_iter()
            .filter_map(|point| {
                let text = payload_str(&point.payload, "text")?;
                Some(PassageHit {
                    chunk: RegulatoryChunk {
                        id: payload_str(&point.payload, "id").unwrap_or_default(),
                        citation: payload_str(&point.payload, "citation")
                            .unwrap_or_else(|| "unknown source".to_string()),
                        text,
                    },
                    score: point.score,
                })
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running Qdrant instance
    async fn test_find_similar_against_live_instance() {
        let provider = QdrantVectorProvider::new(
            "http://localhost:6333".to_string(),
            "drug_embeddings_biobert".to_string(),
            "regulatory_passages".to_string(),
            Duration::from_secs(3),
        );
        let hits = provider
            .find_similar_drugs(&DrugId::from("DB00945"), 5)
            .await
            .unwrap();
        assert!(hits.len() <= 5);
    }
}
