//! Object storage and identity provider access
//!
//! `StorageService` owns the provider handle and its lifecycle: it is constructed
//! uninitialized, bound to a provider once at startup, and then shared read-only
//! between requests. Every operation before initialization fails with
//! `StorageError::NotInitialized`.

pub mod supabase;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use supabase::SupabaseClient;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage client not initialized. Call initialize() during startup")]
    NotInitialized,

    #[error("Storage credentials not configured. Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Storage provider error: {0}")]
    Provider(String),

    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Operations the service needs from the external storage/auth provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Resolve a bearer token to the id of the user it was issued to
    async fn verify(&self, token: &str) -> StorageResult<Uuid>;

    /// Mint a time-limited download URL for an object
    async fn sign_url(&self, path: &str, expires_in: u64) -> StorageResult<String>;

    async fn delete_objects(&self, paths: &[String]) -> StorageResult<()>;

    /// Exchange email and password for an access token
    async fn password_sign_in(&self, email: &str, password: &str) -> StorageResult<String>;
}

pub struct StorageService {
    config: StorageConfig,
    provider: OnceLock<Arc<dyn StorageProvider>>,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            provider: OnceLock::new(),
        }
    }

    /// Bind the Supabase client built from the configured credentials.
    /// A second call is a no-op.
    pub fn initialize(&self) -> StorageResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let (url, key) = match (&self.config.url, &self.config.service_key) {
            (Some(url), Some(key)) => (url, key),
            _ => return Err(StorageError::MissingCredentials),
        };

        let client = SupabaseClient::new(
            url,
            key,
            &self.config.bucket,
            Duration::from_secs(self.config.timeout_seconds),
        )?;

        if self.initialize_with(Arc::new(client)) {
            info!(bucket = %self.config.bucket, "Storage service initialized");
        }
        Ok(())
    }

    /// Bind an arbitrary provider. Returns false if one was already bound.
    pub fn initialize_with(&self, provider: Arc<dyn StorageProvider>) -> bool {
        let bound = self.provider.set(provider).is_ok();
        if !bound {
            warn!("Storage service already initialized, keeping the existing provider");
        }
        bound
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.get().is_some()
    }

    fn provider(&self) -> StorageResult<&Arc<dyn StorageProvider>> {
        self.provider.get().ok_or(StorageError::NotInitialized)
    }

    pub async fn verify(&self, token: &str) -> StorageResult<Uuid> {
        self.provider()?.verify(token).await
    }

    pub async fn sign_url(&self, path: &str, expires_in: u64) -> StorageResult<String> {
        self.provider()?.sign_url(path, expires_in).await
    }

    pub async fn delete_objects(&self, paths: &[String]) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.provider()?.delete_objects(paths).await
    }

    pub async fn password_sign_in(&self, email: &str, password: &str) -> StorageResult<String> {
        self.provider()?.password_sign_in(email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_config(url: Option<&str>, key: Option<&str>) -> StorageConfig {
        StorageConfig {
            url: url.map(str::to_string),
            service_key: key.map(str::to_string),
            bucket: "files".to_string(),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_operations_fail_before_initialization() {
        let service = StorageService::new(storage_config(None, None));
        assert!(!service.is_initialized());

        assert!(matches!(service.verify("token").await, Err(StorageError::NotInitialized)));
        assert!(matches!(
            service.sign_url("a/b.txt", 3600).await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            service.delete_objects(&["a/b.txt".to_string()]).await,
            Err(StorageError::NotInitialized)
        ));
        assert!(matches!(
            service.password_sign_in("a@b.c", "pw").await,
            Err(StorageError::NotInitialized)
        ));
    }

    #[test]
    fn test_initialize_requires_credentials() {
        let service = StorageService::new(storage_config(Some("http://localhost:54321"), None));
        assert!(matches!(service.initialize(), Err(StorageError::MissingCredentials)));
        assert!(!service.is_initialized());

        let service = StorageService::new(storage_config(None, Some("key")));
        assert!(matches!(service.initialize(), Err(StorageError::MissingCredentials)));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let service = StorageService::new(storage_config(Some("http://localhost:54321"), Some("key")));
        tokio_test::assert_ok!(service.initialize());
        assert!(service.is_initialized());
        tokio_test::assert_ok!(service.initialize());
        assert!(!service.initialize_with(Arc::new(MockStorageProvider::new())));
    }

    #[tokio::test]
    async fn test_operations_forward_to_provider() {
        let user_id = Uuid::new_v4();
        let mut provider = MockStorageProvider::new();
        provider
            .expect_verify()
            .withf(|token| token == "good-token")
            .returning(move |_| Ok(user_id));
        provider
            .expect_sign_url()
            .withf(|path, expires_in| path == "u/a.txt" && *expires_in == 3600)
            .returning(|_, _| Ok("https://storage.test/signed".to_string()));
        provider
            .expect_delete_objects()
            .withf(|paths| paths.len() == 1 && paths[0] == "u/a.txt")
            .times(1)
            .returning(|_| Ok(()));

        let service = StorageService::new(storage_config(None, None));
        assert!(service.initialize_with(Arc::new(provider)));

        assert_eq!(service.verify("good-token").await.unwrap(), user_id);
        assert_eq!(
            service.sign_url("u/a.txt", 3600).await.unwrap(),
            "https://storage.test/signed"
        );
        tokio_test::assert_ok!(service.delete_objects(&["u/a.txt".to_string()]).await);
    }

    #[tokio::test]
    async fn test_delete_nothing_skips_provider() {
        let service = StorageService::new(storage_config(None, None));
        assert!(service.initialize_with(Arc::new(MockStorageProvider::new())));
        tokio_test::assert_ok!(service.delete_objects(&[]).await);
    }

    #[tokio::test]
    async fn test_provider_errors_pass_through() {
        let mut provider = MockStorageProvider::new();
        provider
            .expect_password_sign_in()
            .returning(|_, _| Err(StorageError::Auth("Invalid login credentials".to_string())));

        let service = StorageService::new(storage_config(None, None));
        service.initialize_with(Arc::new(provider));

        let err = service.password_sign_in("a@b.c", "wrong").await.unwrap_err();
        assert!(matches!(err, StorageError::Auth(_)));
    }
}
