use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod corpus;
mod model;
mod provider;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();
    let corpus_config = config.corpus.clone();

    // Fail closed: a broken corpus means no server
    let state = match AppState::new(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    let query_service = web::Data::from(state.query_service);
    let corpus = web::Data::new(state.corpus);
    let cache = web::Data::new(state.cache);
    let corpus_config = web::Data::new(corpus_config);

    tracing::info!("Starting pharma safety intel server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(query_service.clone())
            .app_data(corpus.clone())
            .app_data(cache.clone())
            .app_data(corpus_config.clone())
            .configure(api::query::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
