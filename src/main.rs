// Main entry point - Dependency injection and server setup
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use pipeline_profiler::application::profile_service::ProfileService;
use pipeline_profiler::infrastructure::config::load_service_config;
use pipeline_profiler::infrastructure::open_elevation::OpenElevationResolver;
use pipeline_profiler::presentation::app_state::AppState;
use pipeline_profiler::presentation::handlers::{
    calculate_points, create_profile, health_check, parse_trace, validate_trace,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_service_config()?;

    // Create elevation resolver (infrastructure layer)
    let resolver = Arc::new(OpenElevationResolver::new(
        config.elevation.base_url.clone(),
        config.elevation.timeout(),
        config.elevation.batch_size,
    )?);

    // Create services (application layer)
    let profile_service =
        ProfileService::new(resolver).with_max_document_bytes(config.server.max_document_bytes);

    // Create application state
    let state = Arc::new(AppState { profile_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/traces/validate", post(validate_trace))
        .route("/traces/parse", post(parse_trace))
        .route("/profiles", post(create_profile))
        .route("/profiles/points", post(calculate_points))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server.socket_addr()?;
    tracing::info!("Starting pipeline-profiler service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
