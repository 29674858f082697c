use axum::{
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use formcheck::app_state::AppState;
use formcheck::config::AppConfig;
use formcheck::db;
use formcheck::routes;
use formcheck::services::{auth::AuthKeys, push::PushClient, queue::JobQueue, sweeper};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing formcheck server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // Register application metrics
    metrics::describe_counter!(
        "analysis_jobs_submitted_total",
        "Total analysis jobs submitted"
    );
    metrics::describe_counter!(
        "analysis_jobs_completed_total",
        "Total analysis jobs completed"
    );
    metrics::describe_counter!(
        "analysis_results_divergent_total",
        "Result reports that diverged from an already-stored result"
    );
    metrics::describe_counter!(
        "queue_publish_failures_total",
        "Queue publishes that failed or timed out"
    );
    metrics::describe_counter!(
        "push_delivery_failures_total",
        "Push notifications the gateway did not accept"
    );
    metrics::describe_gauge!(
        "analysis_jobs_stale_pending",
        "Jobs still pending past the dispatch timeout"
    );
    metrics::describe_gauge!(
        "analysis_queue_depth",
        "Messages waiting in the analysis queue"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis job queue publisher
    tracing::info!("Connecting to Redis job queue");
    let queue = JobQueue::new(
        &config.redis_url,
        Duration::from_secs(config.publish_timeout_secs),
    )
    .expect("Failed to initialize job queue");

    // Initialize push delivery client
    tracing::info!("Initializing push delivery client");
    let push = PushClient::new(
        &config.push_endpoint,
        Duration::from_secs(config.push_timeout_secs),
    )
    .expect("Failed to initialize push client");

    // Token signing keys
    let auth = AuthKeys::new(&config.jwt_secret, config.jwt_expiration_secs);

    // Create shared application state
    let state = AppState::new(db_pool, queue, push, auth);

    // Stale-pending detection loop
    sweeper::spawn(
        state.clone(),
        Duration::from_secs(config.stale_sweep_interval_secs),
        chrono::Duration::seconds(config.stale_job_timeout_secs),
    );

    // Build API routes
    let metrics_handle = prometheus_handle.clone();
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route(
            "/api/v1/videos",
            post(routes::videos::submit_video).get(routes::videos::videos_by_exercise),
        )
        .route(
            "/api/v1/videos/results",
            post(routes::videos::receive_results),
        )
        .route(
            "/api/v1/videos/categories",
            get(routes::videos::analysis_categories),
        )
        .route(
            "/api/v1/videos/summary",
            get(routes::videos::analysis_summary),
        )
        .route(
            "/api/v1/notifications/unread",
            get(routes::notifications::unread_notifications),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(routes::notifications::mark_notification_read),
        )
        .route(
            "/api/v1/users/push-token",
            put(routes::users::register_push_token),
        )
        .with_state(state)
        // Prometheus metrics endpoint
        .route(
            "/metrics",
            get(move || {
                let handle = metrics_handle.clone();
                async move { handle.render() }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(256 * 1024)); // JSON bodies only

    tracing::info!("Starting formcheck on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
