use podcast_points_backend::controllers::{
    generation::GenerationController, points::PointsController,
    reservations::ReservationController,
};
use podcast_points_backend::domain::auth::JwtManager;
use podcast_points_backend::domain::generation::GenerationService;
use podcast_points_backend::domain::points::PointsService;
use podcast_points_backend::infrastructure::auth::PipelineToken;
use podcast_points_backend::infrastructure::config::{Config, LedgerBackend, LogFormat};
use podcast_points_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use podcast_points_backend::infrastructure::http::{build_router, start_http_server, HttpDependencies};
use podcast_points_backend::infrastructure::pipeline::HttpGenerationPipeline;
use podcast_points_backend::infrastructure::repositories::{
    InMemoryLedgerStore, LedgerStore, PgLedgerStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Podcast Points Backend on {}:{}",
        config.host,
        config.port
    );

    // === LEDGER STORE ===
    let store: Arc<dyn LedgerStore> = match config.ledger_backend {
        LedgerBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set")?;
            let pool = create_pool(database_url).await?;
            check_connection(&pool).await?;
            tracing::info!("Database connection verified");

            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(PgLedgerStore::new(Arc::new(pool)))
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using the in-memory ledger; balances are lost on restart");
            Arc::new(InMemoryLedgerStore::new())
        }
    };

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Outbound clients
    let pipeline = Arc::new(HttpGenerationPipeline::new(
        &config.pipeline_base_url,
        &config.public_base_url,
        config.pipeline_callback_token.clone(),
        Duration::from_secs(config.pipeline_timeout_secs),
    )?);

    // 2. Services
    tracing::info!("Instantiating services...");
    let points_service = Arc::new(PointsService::new(
        store.clone(),
        config.ledger_policy(),
        config.points_settings(),
    ));
    let generation_service = Arc::new(GenerationService::new(
        points_service.clone(),
        pipeline,
        config.cost_schedule(),
        config.max_content_chars,
    ));

    // 3. Controllers
    tracing::info!("Instantiating controllers...");
    let deps = HttpDependencies {
        store,
        jwt_manager: Arc::new(JwtManager::new(&config.jwt_secret)),
        pipeline_token: PipelineToken(config.pipeline_callback_token.as_str().into()),
        points_controller: Arc::new(PointsController::new(points_service.clone())),
        generation_controller: Arc::new(GenerationController::new(generation_service)),
        reservation_controller: Arc::new(ReservationController::new(points_service)),
    };

    let app = build_router(&config, deps);
    start_http_server(&config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "podcast_points_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
