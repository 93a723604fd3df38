//! Health check endpoints for Kubernetes liveness and readiness probes

use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::corpus::CorpusHandle;
use crate::service::InteractionCache;

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessStatus {
    pub status: String,
    pub version: String,
    pub dependencies: DependencyHealth,
}

#[derive(Serialize, ToSchema)]
pub struct DependencyHealth {
    pub corpus: String,
    pub cache: String,
}

/// Liveness probe endpoint
///
/// Always returns 200 OK if the service is running.
/// Used by Kubernetes to determine if the pod should be restarted.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthStatus)
    ),
    tag = "health"
)]
#[get("/health/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe endpoint
///
/// Returns 200 OK if the service is ready to accept traffic. The corpus is
/// loaded before the server binds, so readiness reports its size; an empty
/// vocabulary would have failed startup.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessStatus),
        (status = 503, description = "Service is not ready", body = ReadinessStatus)
    ),
    tag = "health"
)]
#[get("/health/ready")]
pub async fn readiness(
    corpus: web::Data<CorpusHandle>,
    cache: web::Data<Option<InteractionCache>>,
) -> impl Responder {
    let snapshot = corpus.current();
    let corpus_ready = !snapshot.vocabulary.is_empty();
    let corpus_status = if corpus_ready {
        format!("loaded ({} drugs)", snapshot.vocabulary.len())
    } else {
        "empty".to_string()
    };

    // Cache is optional and non-critical
    let cache_status = match cache.as_ref() {
        Some(_) => "healthy",
        None => "disabled",
    };

    let status = ReadinessStatus {
        status: if corpus_ready { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: DependencyHealth {
            corpus: corpus_status,
            cache: cache_status.to_string(),
        },
    };

    if corpus_ready {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(liveness).service(readiness);
}
