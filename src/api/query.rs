//! REST API endpoints for pharmaceutical queries

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::error::ApiError;
use crate::corpus::CorpusHandle;
use crate::model::{CorpusConfig, ResponsePayload};
use crate::service::QueryService;

/// Free-text query request
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// The user's question, e.g. "can I take aspirin with warfarin?"
    pub query: String,
}

/// Full outcome: structured payload plus the optional phrased answer
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub payload: ResponsePayload,
    /// Natural-language answer, when a language model is configured and
    /// responded in time
    pub answer: Option<String>,
}

/// Explicit interaction check request
#[derive(Debug, Deserialize, ToSchema)]
pub struct InteractionsRequest {
    /// Drug names to check pairwise
    pub drugs: Vec<String>,
}

/// Alternative-drug search request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AlternativesRequest {
    pub drug: String,
    /// Maximum results (defaults to the configured limit)
    pub limit: Option<usize>,
}

/// Drug name resolution request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    pub drug: String,
}

/// Drug name resolution result
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveResponse {
    /// The name as submitted
    pub input: String,
    pub resolved: bool,
    pub drug_id: Option<String>,
    pub canonical_name: Option<String>,
    /// 1.0 for an exact match, the fuzzy score otherwise
    pub score: f64,
}

/// Answer a free-text pharmaceutical query
#[utoipa::path(
    post,
    path = "/v1/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query processed", body = QueryResponse),
        (status = 400, description = "Empty or malformed query")
    ),
    tag = "query"
)]
#[post("/v1/query")]
pub async fn process_query(
    service: web::Data<QueryService>,
    request: web::Json<QueryRequest>,
) -> Result<HttpResponse, ApiError> {
    let outcome = service.process(&request.query).await?;

    tracing::info!(
        intent = %outcome.payload.intent,
        degraded = outcome.payload.degraded,
        matches = outcome.payload.matches.len(),
        "Query processed"
    );

    Ok(HttpResponse::Ok().json(QueryResponse {
        payload: outcome.payload,
        answer: outcome.answer,
    }))
}

/// Check interactions among an explicit list of drugs
#[utoipa::path(
    post,
    path = "/v1/interactions",
    request_body = InteractionsRequest,
    responses(
        (status = 200, description = "Interaction payload", body = ResponsePayload),
        (status = 400, description = "No drug names provided")
    ),
    tag = "query"
)]
#[post("/v1/interactions")]
pub async fn check_interactions(
    service: web::Data<QueryService>,
    request: web::Json<InteractionsRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = service.check_interactions(&request.drugs).await?;
    Ok(HttpResponse::Ok().json(payload))
}

/// Find alternative drugs by embedding similarity
#[utoipa::path(
    post,
    path = "/v1/alternatives",
    request_body = AlternativesRequest,
    responses(
        (status = 200, description = "Alternatives payload", body = ResponsePayload),
        (status = 400, description = "Empty drug name")
    ),
    tag = "query"
)]
#[post("/v1/alternatives")]
pub async fn find_alternatives(
    service: web::Data<QueryService>,
    request: web::Json<AlternativesRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = service
        .find_alternatives(&request.drug, request.limit)
        .await?;
    Ok(HttpResponse::Ok().json(payload))
}

/// Resolve (and correct) a drug name against the vocabulary
#[utoipa::path(
    post,
    path = "/v1/resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolution result", body = ResolveResponse),
        (status = 400, description = "Empty drug name")
    ),
    tag = "query"
)]
#[post("/v1/resolve")]
pub async fn resolve_name(
    service: web::Data<QueryService>,
    request: web::Json<ResolveRequest>,
) -> Result<HttpResponse, ApiError> {
    let resolved = service.resolve_name(&request.drug)?;

    Ok(HttpResponse::Ok().json(ResolveResponse {
        input: resolved.input,
        resolved: resolved.id.is_some(),
        drug_id: resolved.id.map(|id| id.to_string()),
        canonical_name: resolved.canonical_name,
        score: resolved.score,
    }))
}

/// Corpus reload result
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    pub status: String,
}

/// Reload the corpus from disk and swap the active snapshot atomically
///
/// On failure the previous snapshot stays in service.
#[utoipa::path(
    post,
    path = "/v1/reload",
    responses(
        (status = 200, description = "Corpus reloaded", body = ReloadResponse),
        (status = 500, description = "Reload failed; previous corpus still active")
    ),
    tag = "admin"
)]
#[post("/v1/reload")]
pub async fn reload_corpus(
    corpus: web::Data<CorpusHandle>,
    config: web::Data<CorpusConfig>,
) -> Result<HttpResponse, ApiError> {
    let handle = corpus.get_ref().clone();
    let corpus_config = config.get_ref().clone();

    // Corpus parsing is file I/O; keep it off the async workers
    let result = web::block(move || handle.reload(&corpus_config))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(ReloadResponse {
            status: "reloaded".to_string(),
        })),
        Err(e) => Err(ApiError::Internal(format!(
            "corpus reload failed, previous snapshot retained: {}",
            e
        ))),
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        process_query,
        check_interactions,
        find_alternatives,
        resolve_name,
        reload_corpus,
        crate::api::health::liveness,
        crate::api::health::readiness,
    ),
    components(schemas(
        QueryRequest,
        QueryResponse,
        InteractionsRequest,
        AlternativesRequest,
        ResolveRequest,
        ResolveResponse,
        ReloadResponse,
        ResponsePayload,
        crate::model::MatchFact,
        crate::model::InteractionSeverity,
        crate::model::QueryIntent,
        crate::api::health::HealthStatus,
        crate::api::health::ReadinessStatus,
        crate::api::health::DependencyHealth,
    )),
    tags(
        (name = "query", description = "Pharmaceutical query endpoints"),
        (name = "admin", description = "Corpus administration"),
        (name = "health", description = "Health probes")
    )
)]
pub struct ApiDoc;

/// Configure query routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(process_query)
        .service(check_interactions)
        .service(find_alternatives)
        .service(resolve_name)
        .service(reload_corpus);
}
