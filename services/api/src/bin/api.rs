//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonStoreAdapter, UploadStore},
    config::Config,
    error::ApiError,
    web::{self, state::AppState, ApiDoc},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Store and Upload Adapters ---
    info!(
        "Using store documents {} and {}",
        config.data_file.display(),
        config.pharmacy_file.display()
    );
    let store = Arc::new(JsonStoreAdapter::new(
        config.data_file.clone(),
        config.pharmacy_file.clone(),
    ));
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        uploads,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("Invalid CORS origin: {e}"))
        })?)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = web::router(app_state).layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
