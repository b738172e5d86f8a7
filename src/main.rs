// Main entry point - Dependency injection and server setup
use std::sync::Arc;

use bi_insight_hub::application::analysis_service::AnalysisService;
use bi_insight_hub::application::dashboard_service::DashboardService;
use bi_insight_hub::infrastructure::config::load_app_config;
use bi_insight_hub::infrastructure::database;
use bi_insight_hub::infrastructure::gemini_client::GeminiClient;
use bi_insight_hub::infrastructure::sql_repository::SqlRepository;
use bi_insight_hub::presentation::app_state::AppState;
use bi_insight_hub::presentation::routes::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bi_insight_hub=debug")),
        )
        .init();

    // Load configuration; a missing AI credential stops startup here
    let config = load_app_config()?;
    let model = Arc::new(GeminiClient::from_settings(&config.gemini)?);

    // Create repository (infrastructure layer)
    let pool = database::connect(&config.database.url, config.database.max_connections).await?;
    let repository = Arc::new(SqlRepository::new(pool));

    // Create services (application layer)
    let dashboard_service = DashboardService::new(repository.clone());
    let analysis_service = AnalysisService::new(
        model,
        repository.clone(),
        repository,
        config.analysis.language.clone(),
    );

    let state = Arc::new(AppState {
        dashboard_service,
        analysis_service,
    });

    // Build router (presentation layer)
    let router = build_router(state, config.server.body_limit_bytes);

    // Start server
    let addr = config.server.bind_address();
    tracing::info!("Starting bi-insight-hub on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(&addr).await?, router).await?;

    Ok(())
}
