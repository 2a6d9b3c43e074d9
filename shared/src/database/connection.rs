use std::time::Duration;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Pool, Postgres,
};
use tracing::{debug, error, info, warn};

use super::{DatabaseConfig, DatabaseError, DatabaseResult};

/// Type alias for the database pool
pub type DbPool = Pool<Postgres>;

/// Create a new connection pool with the given configuration
pub async fn create_connection_pool(config: &DatabaseConfig) -> DatabaseResult<DbPool> {
    if config.url.is_empty() {
        return Err(DatabaseError::Config("Database URL is empty".to_string()));
    }

    info!("Creating database connection pool...");
    debug!("Database url: {}", config.redacted_url());

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
        .max_lifetime(Some(Duration::from_secs(1800))) // 30 minutes
        .test_before_acquire(true)
        .connect(&config.url)
        .await
        .map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            DatabaseError::Connection(e)
        })?;

    info!(
        "Database connection pool created successfully with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Test database connection
pub async fn test_connection(pool: &PgPool) -> DatabaseResult<()> {
    debug!("Testing database connection...");

    let row: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Database connection test failed: {}", e);
            DatabaseError::Connection(e)
        })?;

    if row.0 != 1 {
        return Err(DatabaseError::Query("Unexpected result from connection test".to_string()));
    }

    Ok(())
}

/// Connection health check
pub async fn health_check(pool: &PgPool) -> bool {
    match test_connection(pool).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Database health check failed: {}", e);
            false
        }
    }
}

/// Close database connections gracefully
pub async fn close_connections(pool: &PgPool) {
    info!("Closing database connections...");
    pool.close().await;
    info!("Database connections closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let config = DatabaseConfig::new("");
        let result = create_connection_pool(&config).await;
        assert!(matches!(result, Err(DatabaseError::Config(_))));
    }
}
