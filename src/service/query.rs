//! Query orchestration
//!
//! One strictly sequential pipeline per request:
//! received -> extracting -> classifying -> retrieving -> synthesizing,
//! finishing completed or degraded. Provider failures and timeouts never
//! surface as request errors; they produce a degraded payload with an
//! explicit flag and no fabricated severity. Nothing about the request is
//! retained after the response is built.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::corpus::{CorpusHandle, Resolution};
use crate::model::{
    DrugId, ExtractedEntity, InteractionEdge, QueryIntent, ResponsePayload, RetrievalConfig,
    TimeoutConfig,
};
use crate::provider::{InteractionGraph, ProviderError, TextEmbedder, VectorSearch};
use crate::service::cache::InteractionCache;
use crate::service::extraction::EntityExtractionService;
use crate::service::intent::IntentClassificationService;
use crate::service::phrasing::PhrasingService;
use crate::service::synthesis::{self, Retrieved, validate_payload};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// Rejected at the boundary, before any collaborator is touched
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// The factual payload plus the optional phrased answer. The answer is
/// derived from the payload after it is finalized and never feeds back into
/// it.
#[derive(Debug)]
pub struct QueryOutcome {
    pub payload: ResponsePayload,
    pub answer: Option<String>,
}

/// Pipeline stage, for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryState {
    Extracting,
    Classifying,
    Retrieving,
    Synthesizing,
    Completed,
    Degraded,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryState::Extracting => "extracting",
            QueryState::Classifying => "classifying",
            QueryState::Retrieving => "retrieving",
            QueryState::Synthesizing => "synthesizing",
            QueryState::Completed => "completed",
            QueryState::Degraded => "degraded",
        };
        write!(f, "{}", s)
    }
}

/// A drug name resolved through the vocabulary.
#[derive(Debug, Clone)]
pub struct ResolvedName {
    pub input: String,
    pub id: Option<DrugId>,
    pub canonical_name: Option<String>,
    /// 1.0 for exact matches, the fuzzy score otherwise
    pub score: f64,
}

/// Orchestrates extraction, classification, retrieval, and synthesis.
pub struct QueryService {
    corpus: CorpusHandle,
    extraction: EntityExtractionService,
    intent: IntentClassificationService,
    graph: Arc<dyn InteractionGraph>,
    vectors: Arc<dyn VectorSearch>,
    embedder: Option<Arc<dyn TextEmbedder>>,
    phrasing: Option<PhrasingService>,
    cache: Option<InteractionCache>,
    retrieval: RetrievalConfig,
    timeouts: TimeoutConfig,
}

impl QueryService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        corpus: CorpusHandle,
        extraction: EntityExtractionService,
        intent: IntentClassificationService,
        graph: Arc<dyn InteractionGraph>,
        vectors: Arc<dyn VectorSearch>,
        embedder: Option<Arc<dyn TextEmbedder>>,
        phrasing: Option<PhrasingService>,
        cache: Option<InteractionCache>,
        retrieval: RetrievalConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            corpus,
            extraction,
            intent,
            graph,
            vectors,
            embedder,
            phrasing,
            cache,
            retrieval,
            timeouts,
        }
    }

    /// Process a free-text query end to end.
    pub async fn process(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidRequest(
                "query text must not be empty".to_string(),
            ));
        }

        let started = std::time::Instant::now();
        let deadline = Duration::from_millis(self.timeouts.request_ms);
        let payload = match tokio::time::timeout(deadline, self.run_pipeline(query)).await {
            Ok(payload) => payload,
            Err(_) => {
                tracing::warn!(
                    state = %QueryState::Degraded,
                    deadline_ms = self.timeouts.request_ms,
                    "Request deadline exceeded"
                );
                synthesis::synthesize_degraded(QueryIntent::GeneralQuery, &[])
            }
        };

        let payload = self.ensure_valid(payload);
        // Phrasing runs inside whatever is left of the request deadline, so
        // the total never exceeds request_ms
        let remaining = deadline.saturating_sub(started.elapsed());
        let answer = self.phrase_answer(&payload, remaining).await;

        Ok(QueryOutcome { payload, answer })
    }

    async fn run_pipeline(&self, query: &str) -> ResponsePayload {
        tracing::debug!(state = %QueryState::Extracting, "Processing query");
        let entities = self.extraction.extract(query).await;

        tracing::debug!(
            state = %QueryState::Classifying,
            entities = entities.len(),
            "Entities extracted"
        );
        let (intent, confidence) = self.intent.classify(query, &entities).await;

        tracing::debug!(
            state = %QueryState::Retrieving,
            intent = %intent,
            confidence = confidence,
            "Intent classified"
        );

        let retrieved = match self.retrieve(intent, query, &entities).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                tracing::warn!(
                    state = %QueryState::Degraded,
                    intent = %intent,
                    error = %e,
                    "Retrieval failed, degrading response"
                );
                return synthesis::synthesize_degraded(intent, &entities);
            }
        };

        tracing::debug!(state = %QueryState::Synthesizing, "Retrieval complete");
        let payload = synthesis::synthesize(intent, &entities, &retrieved);

        tracing::debug!(
            state = %QueryState::Completed,
            matches = payload.matches.len(),
            severity = ?payload.severity,
            "Payload synthesized"
        );
        payload
    }

    async fn retrieve(
        &self,
        intent: QueryIntent,
        query: &str,
        entities: &[ExtractedEntity],
    ) -> Result<Retrieved, ProviderError> {
        match intent {
            QueryIntent::CheckInteraction => {
                let ids: Vec<DrugId> =
                    entities.iter().filter_map(|e| e.resolved.clone()).collect();
                let edges = self.lookup_interactions(&ids).await?;
                Ok(Retrieved {
                    edges,
                    ..Default::default()
                })
            }
            QueryIntent::FindSimilar => {
                let source = entities.iter().find_map(|e| e.resolved.clone());
                let similar = match source {
                    Some(id) => self.lookup_alternatives(&id, self.retrieval.max_results).await?,
                    None => Vec::new(),
                };
                Ok(Retrieved {
                    similar,
                    ..Default::default()
                })
            }
            QueryIntent::LegalQuery => {
                let embedder = self
                    .embedder
                    .as_ref()
                    .ok_or_else(|| {
                        ProviderError::Unavailable("no embedding service configured".to_string())
                    })?;

                let embedding = self
                    .with_provider_timeout(embedder.embed(query))
                    .await?;
                let passages = self
                    .with_provider_timeout(
                        self.vectors
                            .retrieve_passages(&embedding, self.retrieval.max_results),
                    )
                    .await?;
                Ok(Retrieved {
                    passages,
                    ..Default::default()
                })
            }
            QueryIntent::GeneralQuery => Ok(Retrieved::default()),
        }
    }

    /// Graph lookup with the cache in front. Only corpus-derived facts keyed
    /// by canonical id sets touch the cache; query text never does.
    async fn lookup_interactions(
        &self,
        ids: &[DrugId],
    ) -> Result<Vec<InteractionEdge>, ProviderError> {
        if ids.len() < 2 {
            return Ok(Vec::new());
        }

        let key = InteractionCache::pair_set_key(self.corpus.generation(), ids);
        if let Some(cache) = &self.cache {
            if let Ok(edges) = cache.get_interactions::<Vec<InteractionEdge>>(&key).await {
                tracing::debug!(pairs_key = %key, "Interaction cache hit");
                return Ok(edges);
            }
        }

        let edges = self
            .with_provider_timeout(self.graph.lookup_pairs(ids))
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_interactions(&key, &edges).await {
                tracing::warn!(error = %e, "Failed to cache interaction lookup");
            }
        }

        Ok(edges)
    }

    async fn lookup_alternatives(
        &self,
        id: &DrugId,
        limit: usize,
    ) -> Result<Vec<crate::provider::SimilarDrug>, ProviderError> {
        let key = InteractionCache::alternatives_key(self.corpus.generation(), id, limit);
        if let Some(cache) = &self.cache {
            if let Ok(hits) = cache
                .get_alternatives::<Vec<crate::provider::SimilarDrug>>(&key)
                .await
            {
                tracing::debug!(key = %key, "Alternatives cache hit");
                return Ok(hits);
            }
        }

        let hits = self
            .with_provider_timeout(self.vectors.find_similar_drugs(id, limit))
            .await?;

        // Threshold filter happens here so every store implementation gets
        // the same cutoff
        let mut filtered: Vec<_> = hits
            .into_iter()
            .filter(|h| h.score >= self.retrieval.similarity_threshold)
            .collect();
        filtered.truncate(limit);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_alternatives(&key, &filtered).await {
                tracing::warn!(error = %e, "Failed to cache alternatives lookup");
            }
        }

        Ok(filtered)
    }

    async fn with_provider_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match tokio::time::timeout(Duration::from_millis(self.timeouts.provider_ms), fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }

    /// Postcondition gate. Synthesis always satisfies it; if a payload ever
    /// arrives here broken, it is replaced with a degraded one rather than
    /// released.
    fn ensure_valid(&self, payload: ResponsePayload) -> ResponsePayload {
        match validate_payload(&payload) {
            Ok(()) => payload,
            Err(e) => {
                tracing::error!(error = %e, intent = %payload.intent, "Payload failed validation, degrading");
                synthesis::synthesize_degraded(payload.intent, &[])
            }
        }
    }

    async fn phrase_answer(&self, payload: &ResponsePayload, remaining: Duration) -> Option<String> {
        let phrasing = self.phrasing.as_ref()?;

        let budget = Duration::from_millis(self.timeouts.phrasing_ms).min(remaining);
        if budget.is_zero() {
            tracing::warn!("Request deadline spent before phrasing, returning payload without answer");
            return None;
        }

        match tokio::time::timeout(budget, phrasing.phrase(payload)).await {
            Ok(Ok(answer)) => Some(answer),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Phrasing failed, returning payload without answer");
                None
            }
            Err(_) => {
                tracing::warn!(
                    budget_ms = budget.as_millis() as u64,
                    "Phrasing timed out, returning payload without answer"
                );
                None
            }
        }
    }

    /// Interaction check for an explicit drug list, bypassing extraction and
    /// classification.
    pub async fn check_interactions(
        &self,
        names: &[String],
    ) -> Result<ResponsePayload, QueryError> {
        if names.is_empty() || names.iter().all(|n| n.trim().is_empty()) {
            return Err(QueryError::InvalidRequest(
                "at least one drug name is required".to_string(),
            ));
        }

        let entities = self.resolve_as_entities(names);
        let ids: Vec<DrugId> = entities.iter().filter_map(|e| e.resolved.clone()).collect();

        let payload = match self.lookup_interactions(&ids).await {
            Ok(edges) => synthesis::synthesize(
                QueryIntent::CheckInteraction,
                &entities,
                &Retrieved {
                    edges,
                    ..Default::default()
                },
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Interaction lookup failed, degrading response");
                synthesis::synthesize_degraded(QueryIntent::CheckInteraction, &entities)
            }
        };

        Ok(self.ensure_valid(payload))
    }

    /// Alternative-drug search for an explicit drug name.
    pub async fn find_alternatives(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<ResponsePayload, QueryError> {
        if name.trim().is_empty() {
            return Err(QueryError::InvalidRequest(
                "drug name must not be empty".to_string(),
            ));
        }

        let names = [name.to_string()];
        let entities = self.resolve_as_entities(&names);
        let limit = limit.unwrap_or(self.retrieval.max_results);

        let payload = match entities.iter().find_map(|e| e.resolved.clone()) {
            Some(id) => match self.lookup_alternatives(&id, limit).await {
                Ok(similar) => synthesis::synthesize(
                    QueryIntent::FindSimilar,
                    &entities,
                    &Retrieved {
                        similar,
                        ..Default::default()
                    },
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "Alternatives lookup failed, degrading response");
                    synthesis::synthesize_degraded(QueryIntent::FindSimilar, &entities)
                }
            },
            None => synthesis::synthesize(QueryIntent::FindSimilar, &entities, &Retrieved::default()),
        };

        Ok(self.ensure_valid(payload))
    }

    /// Resolve a single drug name through the vocabulary.
    pub fn resolve_name(&self, name: &str) -> Result<ResolvedName, QueryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidRequest(
                "drug name must not be empty".to_string(),
            ));
        }

        let snapshot = self.corpus.current();
        let resolved = match snapshot
            .vocabulary
            .resolve(trimmed, self.retrieval.fuzzy_threshold)
        {
            Resolution::Exact(id) => ResolvedName {
                input: trimmed.to_string(),
                canonical_name: Some(snapshot.vocabulary.canonical_name(&id)),
                id: Some(id),
                score: 1.0,
            },
            Resolution::Fuzzy { id, score } => ResolvedName {
                input: trimmed.to_string(),
                canonical_name: Some(snapshot.vocabulary.canonical_name(&id)),
                id: Some(id),
                score,
            },
            Resolution::Unresolved => ResolvedName {
                input: trimmed.to_string(),
                id: None,
                canonical_name: None,
                score: 0.0,
            },
        };

        Ok(resolved)
    }

    fn resolve_as_entities(&self, names: &[String]) -> Vec<ExtractedEntity> {
        let snapshot = self.corpus.current();
        names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .enumerate()
            .map(|(idx, name)| {
                match snapshot
                    .vocabulary
                    .resolve(name, self.retrieval.fuzzy_threshold)
                {
                    Resolution::Exact(id) => ExtractedEntity {
                        text: name.to_string(),
                        offset: idx,
                        canonical_name: Some(snapshot.vocabulary.canonical_name(&id)),
                        resolved: Some(id),
                        confidence: 1.0,
                    },
                    Resolution::Fuzzy { id, score } => ExtractedEntity {
                        text: name.to_string(),
                        offset: idx,
                        canonical_name: Some(snapshot.vocabulary.canonical_name(&id)),
                        resolved: Some(id),
                        confidence: score,
                    },
                    Resolution::Unresolved => ExtractedEntity {
                        text: name.to_string(),
                        offset: idx,
                        resolved: None,
                        canonical_name: None,
                        confidence: 0.0,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::corpus::{CorpusSnapshot, InteractionIndex, VocabularyIndex};
    use crate::model::{DrugPair, DrugRecord, InteractionSeverity, MatchFact};
    use crate::provider::memory::SnapshotGraph;
    use crate::provider::{PassageHit, SimilarDrug};

    fn snapshot() -> CorpusSnapshot {
        let mut vocabulary = VocabularyIndex::new();
        for (id, name) in [
            ("DB00945", "Aspirin"),
            ("DB00682", "Warfarin"),
            ("DB00316", "Acetaminophen"),
        ] {
            vocabulary
                .insert(DrugRecord {
                    id: DrugId::from(id),
                    name: name.to_string(),
                    synonyms: vec![],
                })
                .unwrap();
        }

        let mut interactions = InteractionIndex::new();
        interactions.insert(InteractionEdge {
            pair: DrugPair::new(DrugId::from("DB00945"), DrugId::from("DB00682")),
            severity: InteractionSeverity::MajorInteraction,
            mechanism: "Increased risk of bleeding".to_string(),
        });

        CorpusSnapshot {
            vocabulary,
            interactions,
            ..Default::default()
        }
    }

    struct EmptyVectors;

    #[async_trait]
    impl VectorSearch for EmptyVectors {
        async fn find_similar_drugs(
            &self,
            _drug_id: &DrugId,
            _k: usize,
        ) -> Result<Vec<SimilarDrug>, ProviderError> {
            Ok(Vec::new())
        }

        async fn retrieve_passages(
            &self,
            _query_embedding: &[f32],
            _k: usize,
        ) -> Result<Vec<PassageHit>, ProviderError> {
            Ok(Vec::new())
        }
    }

    struct FailingGraph;

    #[async_trait]
    impl InteractionGraph for FailingGraph {
        async fn lookup_pairs(
            &self,
            _ids: &[DrugId],
        ) -> Result<Vec<InteractionEdge>, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }
    }

    struct SlowGraph;

    #[async_trait]
    impl InteractionGraph for SlowGraph {
        async fn lookup_pairs(
            &self,
            _ids: &[DrugId],
        ) -> Result<Vec<InteractionEdge>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct TrackingGraph {
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl InteractionGraph for TrackingGraph {
        async fn lookup_pairs(
            &self,
            _ids: &[DrugId],
        ) -> Result<Vec<InteractionEdge>, ProviderError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FixedVectors;

    #[async_trait]
    impl VectorSearch for FixedVectors {
        async fn find_similar_drugs(
            &self,
            _drug_id: &DrugId,
            _k: usize,
        ) -> Result<Vec<SimilarDrug>, ProviderError> {
            Ok(vec![
                SimilarDrug {
                    id: DrugId::from("DB01050"),
                    name: "Ibuprofen".to_string(),
                    score: 0.81,
                },
                SimilarDrug {
                    id: DrugId::from("DB00316"),
                    name: "Acetaminophen".to_string(),
                    score: 0.12,
                },
            ])
        }

        async fn retrieve_passages(
            &self,
            _query_embedding: &[f32],
            _k: usize,
        ) -> Result<Vec<PassageHit>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn service_with(
        graph: Arc<dyn InteractionGraph>,
        vectors: Arc<dyn VectorSearch>,
        timeouts: TimeoutConfig,
    ) -> QueryService {
        let corpus = CorpusHandle::from_snapshot(snapshot());
        QueryService::new(
            corpus.clone(),
            EntityExtractionService::new(corpus.clone(), 0.84, None),
            IntentClassificationService::new(0.5, None),
            graph,
            vectors,
            None,
            None,
            None,
            RetrievalConfig::default(),
            timeouts,
        )
    }

    fn service() -> QueryService {
        let corpus = CorpusHandle::from_snapshot(snapshot());
        let graph = Arc::new(SnapshotGraph::new(corpus.clone()));
        service_with(graph, Arc::new(EmptyVectors), TimeoutConfig::default())
    }

    #[tokio::test]
    async fn test_aspirin_warfarin_flags_major_interaction() {
        let service = service();
        let outcome = service
            .process("Can I take aspirin with warfarin?")
            .await
            .unwrap();

        let payload = outcome.payload;
        assert_eq!(payload.intent, QueryIntent::CheckInteraction);
        assert_eq!(payload.severity, Some(InteractionSeverity::MajorInteraction));
        assert!(matches!(
            &payload.matches[0],
            MatchFact::Interaction { recorded: true, .. }
        ));
        assert!(!payload.disclaimer.is_empty());
        assert!(!payload.degraded);
        // No LLM configured, so no phrased answer
        assert!(outcome.answer.is_none());
    }

    #[tokio::test]
    async fn test_misspelled_pair_still_resolves() {
        let service = service();
        let outcome = service.process("can i take asprin with warfarin").await.unwrap();

        assert_eq!(
            outcome.payload.severity,
            Some(InteractionSeverity::MajorInteraction)
        );
        assert!(outcome.payload.entities.contains(&"Aspirin".to_string()));
    }

    #[tokio::test]
    async fn test_blank_input_fails_fast_without_collaborators() {
        let called = Arc::new(AtomicBool::new(false));
        let graph = Arc::new(TrackingGraph {
            called: Arc::clone(&called),
        });
        let service = service_with(graph, Arc::new(EmptyVectors), TimeoutConfig::default());

        let result = service.process("   ").await;
        assert!(matches!(result, Err(QueryError::InvalidRequest(_))));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_without_severity() {
        let service = service_with(
            Arc::new(FailingGraph),
            Arc::new(EmptyVectors),
            TimeoutConfig::default(),
        );
        let outcome = service
            .process("can i take aspirin with warfarin")
            .await
            .unwrap();

        let payload = outcome.payload;
        assert!(payload.degraded);
        assert!(payload.severity.is_none());
        assert!(payload.matches.is_empty());
        assert!(!payload.disclaimer.is_empty());
        // Entities extracted before the failure are preserved
        assert!(payload.entities.contains(&"Aspirin".to_string()));
    }

    #[tokio::test]
    async fn test_provider_timeout_degrades() {
        let timeouts = TimeoutConfig {
            provider_ms: 20,
            ..Default::default()
        };
        let service = service_with(Arc::new(SlowGraph), Arc::new(EmptyVectors), timeouts);

        let outcome = service
            .process("can i take aspirin with warfarin")
            .await
            .unwrap();

        assert!(outcome.payload.degraded);
        assert!(outcome.payload.severity.is_none());
    }

    #[tokio::test]
    async fn test_phrasing_does_not_extend_the_request_deadline() {
        use crate::service::llm::LlmClient;

        // The pipeline consumes the whole request budget, so no time is
        // left for phrasing and no phrasing call may be attempted
        let corpus = CorpusHandle::from_snapshot(snapshot());
        let timeouts = TimeoutConfig {
            request_ms: 50,
            ..Default::default()
        };
        let service = QueryService::new(
            corpus.clone(),
            EntityExtractionService::new(corpus.clone(), 0.84, None),
            IntentClassificationService::new(0.5, None),
            Arc::new(SlowGraph),
            Arc::new(EmptyVectors),
            None,
            Some(PhrasingService::new(LlmClient::new("test-key"))),
            None,
            RetrievalConfig::default(),
            timeouts,
        );

        let started = std::time::Instant::now();
        let outcome = service
            .process("can i take aspirin with warfarin")
            .await
            .unwrap();

        assert!(outcome.payload.degraded);
        assert!(outcome.answer.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_similarity_applies_threshold() {
        let corpus = CorpusHandle::from_snapshot(snapshot());
        let graph = Arc::new(SnapshotGraph::new(corpus.clone()));
        let service = service_with(graph, Arc::new(FixedVectors), TimeoutConfig::default());

        let outcome = service
            .process("what is an alternative to aspirin")
            .await
            .unwrap();

        let payload = outcome.payload;
        assert_eq!(payload.intent, QueryIntent::FindSimilar);
        // The 0.12 hit falls below the 0.35 threshold
        assert_eq!(payload.matches.len(), 1);
        assert!(matches!(
            &payload.matches[0],
            MatchFact::SimilarDrug { name, .. } if name == "Ibuprofen"
        ));
    }

    #[tokio::test]
    async fn test_legal_query_without_embedder_degrades() {
        let service = service();
        let outcome = service
            .process("what is the penalty for selling misbranded drugs")
            .await
            .unwrap();

        assert_eq!(outcome.payload.intent, QueryIntent::LegalQuery);
        assert!(outcome.payload.degraded);
        assert!(!outcome.payload.disclaimer.is_empty());
    }

    #[tokio::test]
    async fn test_general_query_carries_generic_disclaimer() {
        let service = service();
        let outcome = service.process("tell me about medication storage").await.unwrap();

        assert_eq!(outcome.payload.intent, QueryIntent::GeneralQuery);
        assert!(!outcome.payload.disclaimer.is_empty());
        assert!(!outcome.payload.degraded);
    }

    #[tokio::test]
    async fn test_explicit_interaction_endpoint_path() {
        let service = service();
        let payload = service
            .check_interactions(&["warfarin".to_string(), "aspirin".to_string()])
            .await
            .unwrap();

        assert_eq!(payload.severity, Some(InteractionSeverity::MajorInteraction));
        assert_eq!(payload.entities.len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_interaction_rejects_empty_list() {
        let service = service();
        let result = service.check_interactions(&[]).await;
        assert!(matches!(result, Err(QueryError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_resolve_name_corrects_misspelling() {
        let service = service();
        let resolved = service.resolve_name("asprin").unwrap();
        assert_eq!(resolved.canonical_name.as_deref(), Some("Aspirin"));
        assert!(resolved.score >= 0.84 && resolved.score < 1.0);

        let unresolved = service.resolve_name("notadrug").unwrap();
        assert!(unresolved.id.is_none());
    }

    #[tokio::test]
    async fn test_every_path_carries_disclaimer() {
        let service = service();
        for query in [
            "can i take aspirin with warfarin",
            "what is similar to aspirin",
            "what does the act say about penalties",
            "how should i store medication",
        ] {
            let outcome = service.process(query).await.unwrap();
            assert!(
                !outcome.payload.disclaimer.trim().is_empty(),
                "empty disclaimer for {:?}",
                query
            );
        }
    }
}
