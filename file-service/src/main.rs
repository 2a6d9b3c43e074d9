mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod storage;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use shared::database::{close_connections, create_connection_pool, test_connection};
use shared::observability::{init_logging, LogConfig};

use crate::config::Config;
use crate::db::{FileRepository, PgFileRepository};
use crate::storage::StorageService;

const SERVICE_NAME: &str = "file-service";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_logging(LogConfig::from_env(SERVICE_NAME)?)?;
    info!("Starting File Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let db_pool = create_connection_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    test_connection(&db_pool).await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let storage = Arc::new(StorageService::new(config.storage.clone()));
    storage
        .initialize()
        .context("Failed to initialize storage client")?;

    let app_state = Arc::new(AppState {
        config: config.clone(),
        files: Arc::new(PgFileRepository::new(db_pool.clone())),
        storage,
    });

    let app = router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("File Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_connections(&db_pool).await;
    info!("File Service shut down gracefully");
    Ok(())
}

pub struct AppState {
    pub config: Config,
    pub files: Arc<dyn FileRepository>,
    pub storage: Arc<StorageService>,
}

fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/file",
            post(handlers::files::create_file).get(handlers::files::list_files),
        )
        .route(
            "/file/:id",
            get(handlers::files::get_file)
                .put(handlers::files::update_file)
                .delete(handlers::files::delete_file),
        )
        .route("/file/:id/download", get(handlers::files::download_file))
        .route("/login/access-token", post(handlers::login::access_token));

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/healthz", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readiness))
        .nest("/api", api)
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured origins. Methods and headers are
/// mirrored from the preflight since wildcards are rejected with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
