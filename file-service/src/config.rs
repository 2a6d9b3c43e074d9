use std::fmt;

use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use shared::database::DatabaseConfig;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct StorageConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub bucket: String,
    pub timeout_seconds: u64,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let database_url = var("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        let mut database = DatabaseConfig::new(database_url);
        database.max_connections = or_default("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        database.acquire_timeout_seconds = or_default("DATABASE_ACQUIRE_TIMEOUT_SECONDS", "30")
            .parse()
            .context("DATABASE_ACQUIRE_TIMEOUT_SECONDS must be a positive integer")?;

        let cors_origins = parse_cors_origins(&or_default("CORS_ORIGINS", DEFAULT_CORS_ORIGINS))?;

        Ok(Self {
            server: ServerConfig {
                host: or_default("API_HOST", "0.0.0.0"),
                port: or_default("API_PORT", "8000")
                    .parse()
                    .context("API_PORT must be a valid port number")?,
                cors_origins,
            },
            database,
            storage: StorageConfig {
                url: var("SUPABASE_URL").map(|url| url.trim_end_matches('/').to_string()),
                service_key: var("SUPABASE_SERVICE_ROLE_KEY"),
                bucket: or_default("SUPABASE_BUCKET_NAME", "files"),
                timeout_seconds: or_default("STORAGE_TIMEOUT_SECONDS", "30")
                    .parse()
                    .context("STORAGE_TIMEOUT_SECONDS must be a positive integer")?,
            },
        })
    }
}

/// Accepts either a JSON array (`["http://a", "http://b"]`) or a comma separated list.
fn parse_cors_origins(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let origins: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).context("CORS_ORIGINS is not a valid JSON array of strings")?
    } else {
        raw.split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    };

    for origin in &origins {
        HeaderValue::from_str(origin)
            .with_context(|| format!("CORS origin '{}' is not a valid header value", origin))?;
    }

    Ok(origins)
}
