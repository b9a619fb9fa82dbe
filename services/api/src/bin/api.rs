//! services/api/src/bin/api.rs

use api_lib::{
    adapters::OpenAiAdvisoryAdapter,
    config::Config,
    error::ApiError,
    web::{
        rest::ApiDoc,
        session_snapshot_handler,
        state::{AppState, SessionHub, Timings},
        ws_handler,
    },
};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use remotenet_core::SpeedAdvisoryService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Advisory Adapter ---
    let advisory: Option<Arc<dyn SpeedAdvisoryService>> = match &config.advisory_api_key {
        Some(key) => {
            info!("Speed advisory enabled with model '{}'.", config.advisory_model);
            Some(Arc::new(OpenAiAdvisoryAdapter::from_key(
                key,
                config.advisory_api_base.as_deref(),
                config.advisory_model.clone(),
            )))
        }
        None => {
            warn!("ADVISORY_API_KEY environment variable not set. Speed analysis will use a fallback message.");
            None
        }
    };

    // --- 3. Build the Shared AppState ---
    let hub = SessionHub::new(Timings::from(&config), advisory);
    let app_state = Arc::new(AppState { hub });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/session", get(session_snapshot_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

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
