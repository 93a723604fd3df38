//! Neo4j-backed interaction graph
//!
//! Talks to the Neo4j HTTP transaction API. Each lookup runs a single
//! auto-committed Cypher statement over the `INTERACTS_WITH` relationships,
//! deduplicating symmetric matches with an id ordering predicate.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::corpus::interactions::merge_duplicate_pairs;
use crate::corpus::loader::infer_severity;
use crate::model::{DrugId, DrugPair, InteractionEdge, InteractionSeverity};
use crate::provider::{InteractionGraph, ProviderError};

const ENV_NEO4J_USER: &str = "NEO4J_USER";
const ENV_NEO4J_PASSWORD: &str = "NEO4J_PASSWORD";
const DEFAULT_NEO4J_USER: &str = "neo4j";

const PAIR_QUERY: &str = "MATCH (a:Drug)-[r:INTERACTS_WITH]-(b:Drug) \
     WHERE a.id IN $ids AND b.id IN $ids AND a.id < b.id \
     RETURN DISTINCT a.id AS a_id, b.id AS b_id, r.description AS description, r.severity AS severity";

#[derive(Debug, Deserialize)]
struct TxResponse {
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: (String, String, Option<String>, Option<String>),
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Client for a Neo4j instance holding the interaction graph.
pub struct Neo4jGraphProvider {
    client: Client,
    /// Transaction commit endpoint, e.g.
    /// `http://localhost:7474/db/neo4j/tx/commit`
    endpoint: String,
    user: String,
    password: Option<String>,
}

impl Neo4jGraphProvider {
    /// Credentials come from `NEO4J_USER` / `NEO4J_PASSWORD`.
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let user = env::var(ENV_NEO4J_USER).unwrap_or_else(|_| DEFAULT_NEO4J_USER.to_string());
        let password = env::var(ENV_NEO4J_PASSWORD).ok();

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint,
            user,
            password,
        }
    }
}

#[async_trait]
impl InteractionGraph for Neo4jGraphProvider {
    async fn lookup_pairs(&self, ids: &[DrugId]) -> Result<Vec<InteractionEdge>, ProviderError> {
        if ids.len() < 2 {
            return Ok(Vec::new());
        }

        let id_strings: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let body = json!({
            "statements": [{
                "statement": PAIR_QUERY,
                "parameters": { "ids": id_strings }
            }]
        });

        tracing::debug!(endpoint = %self.endpoint, ids = ?id_strings, "Querying Neo4j for interaction pairs");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(password) = &self.password {
            request = request.basic_auth(&self.user, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Neo4j returned status {}",
                response.status()
            )));
        }

        let tx: TxResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(err) = tx.errors.first() {
            return Err(ProviderError::Unavailable(format!(
                "Neo4j error {}: {}",
                err.code, err.message
            )));
        }

        let mut edges = Vec::new();
        for result in tx.results {
            for row in result.data {
                let (a_id, b_id, description, severity) = row.row;
                let mechanism = description.unwrap_or_default();
                let severity = severity
                    .as_deref()
                    .and_then(InteractionSeverity::parse)
                    .unwrap_or_else(|| infer_severity(&mechanism));

                edges.push(InteractionEdge {
                    pair: DrugPair::new(DrugId::new(a_id), DrugId::new(b_id)),
                    severity,
                    mechanism,
                });
            }
        }

        Ok(merge_duplicate_pairs(edges))
    }
}
