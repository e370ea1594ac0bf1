use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::domain::auth::JwtManager;
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::LedgerStore;
use crate::{
    controllers::{
        generation::GenerationController, health, points::PointsController,
        reservations::ReservationController,
    },
    infrastructure::auth::{
        auth_middleware, pipeline_auth_middleware, request_id_middleware, PipelineToken,
    },
};

/// Everything the router needs, wired once in `main`
pub struct HttpDependencies {
    pub store: Arc<dyn LedgerStore>,
    pub jwt_manager: Arc<JwtManager>,
    pub pipeline_token: PipelineToken,
    pub points_controller: Arc<PointsController>,
    pub generation_controller: Arc<GenerationController>,
    pub reservation_controller: Arc<ReservationController>,
}

/// Build the application router with all routes configured
pub fn build_router(config: &Config, deps: HttpDependencies) -> Router {
    // Points routes (require authentication)
    let points_routes = Router::new()
        .route("/api/points/account", post(PointsController::ensure_account))
        .route("/api/points/balance", get(PointsController::get_balance))
        .route(
            "/api/points/transactions",
            get(PointsController::list_transactions),
        )
        .route("/api/points/checkin", post(PointsController::checkin))
        .with_state(deps.points_controller)
        .layer(middleware::from_fn_with_state(
            deps.jwt_manager.clone(),
            auth_middleware,
        ));

    // Generation routes (require authentication)
    let generation_routes = Router::new()
        .route("/api/generations", post(GenerationController::submit))
        .route("/api/generations/quote", post(GenerationController::quote))
        .with_state(deps.generation_controller)
        .layer(middleware::from_fn_with_state(
            deps.jwt_manager.clone(),
            auth_middleware,
        ));

    let reservation_routes = Router::new()
        .route(
            "/api/reservations/:id",
            get(ReservationController::get_reservation),
        )
        .with_state(deps.reservation_controller.clone())
        .layer(middleware::from_fn_with_state(
            deps.jwt_manager.clone(),
            auth_middleware,
        ));

    // Settlement callbacks (pipeline token instead of a user JWT)
    let internal_routes = Router::new()
        .route(
            "/internal/reservations/:id/settle",
            post(ReservationController::settle),
        )
        .with_state(deps.reservation_controller)
        .layer(middleware::from_fn_with_state(
            deps.pipeline_token,
            pipeline_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(deps.store)
        .merge(points_routes)
        .merge(generation_routes)
        .merge(reservation_routes)
        .merge(internal_routes)
        .layer(cors_layer(config))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return if config.is_development() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        };
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Serve the router until Ctrl-C
pub async fn start_http_server(
    config: &Config,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
