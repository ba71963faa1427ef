//! services/studio/src/bin/studio.rs
//!
//! The studio server: opens the novel database, wires the generation adapter
//! and serves the REST API with its Swagger UI.

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use studio_lib::{
    adapters::{OpenAiGenerationAdapter, SqliteStore},
    config::Config,
    error::ApiError,
    web::{router, ApiDoc, AppState},
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const POOL_SIZE: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- Settings and logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Storage ---
    let store = SqliteStore::connect(&config.database_url, POOL_SIZE).await?;
    store.run_migrations().await?;
    info!(database = %config.database_url, "Novel database ready");

    // --- Generation ---
    let generator = Arc::new(OpenAiGenerationAdapter::from_endpoint(
        &config.generation_api_base,
        config.require_api_key()?,
        config.generation_model.clone(),
    ));
    info!(
        model = %config.generation_model,
        auto_summary = config.auto_summary,
        "Generation adapter ready"
    );

    let app_state = Arc::new(AppState::new(store.repositories(), generator, config.clone()));

    // The browser editor runs on its own origin.
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!(
        address = %config.bind_address,
        docs = %format!("http://{}/swagger-ui", config.bind_address),
        "Studio listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
