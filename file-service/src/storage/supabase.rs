//! Supabase REST client for token verification, password sign-in and storage objects
//!
//! Talks to the GoTrue (`/auth/v1`) and Storage (`/storage/v1`) HTTP APIs directly
//! with the project's service-role key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{StorageError, StorageProvider, StorageResult};

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

pub struct SupabaseClient {
    http_client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: &str, bucket: &str, timeout: Duration) -> StorageResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    /// Attach the project key; `bearer` defaults to the service-role key
    fn authorized(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(bearer.unwrap_or(&self.service_key))
    }

    fn storage_url(&self, suffix: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, suffix.trim_start_matches('/'))
    }

    /// `{base}/storage/v1/object/{segments..}` with every segment percent-encoded
    fn object_url<'a, I>(&self, segments: I) -> StorageResult<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StorageError::Provider(format!("Invalid storage url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Provider("Storage url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-success response into a provider error carrying status and body
    async fn ensure_success(response: Response, action: &str) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Supabase {} failed: {} - {}", action, status, body);
        Err(StorageError::Provider(format!("{} failed with status {}", action, status)))
    }
}

#[async_trait]
impl StorageProvider for SupabaseClient {
    async fn verify(&self, token: &str) -> StorageResult<Uuid> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .authorized(self.http_client.get(&url), Some(token))
            .send()
            .await
            .map_err(|e| {
                error!("Token verification request failed: {}", e);
                StorageError::Auth("Unable to verify authentication token".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Token verification rejected with status {}", status);
            return Err(StorageError::Auth("Invalid authentication token".to_string()));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Auth(format!("Malformed user response: {}", e)))?;

        Uuid::parse_str(&user.id).map_err(|_| StorageError::Auth("Invalid user ID in token".to_string()))
    }

    async fn sign_url(&self, path: &str, expires_in: u64) -> StorageResult<String> {
        let url = self.object_url(
            ["sign", self.bucket.as_str()]
                .into_iter()
                .chain(path.trim_start_matches('/').split('/')),
        )?;

        let response = self
            .authorized(self.http_client.post(url), None)
            .json(&json!({ "expiresIn": expires_in }))
            .send()
            .await?;
        let response = Self::ensure_success(response, "sign url").await?;

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Provider(format!("Malformed sign response: {}", e)))?;

        debug!("Signed download url for {} ({}s)", path, expires_in);
        Ok(format!("{}&download=", self.storage_url(&signed.signed_url)))
    }

    async fn delete_objects(&self, paths: &[String]) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = self.object_url([self.bucket.as_str()])?;

        let response = self
            .authorized(self.http_client.delete(url), None)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::ensure_success(response, "delete objects").await?;

        info!("Deleted {} object(s) from bucket {}", paths.len(), self.bucket);
        Ok(())
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> StorageResult<String> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.service_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                error!("Password sign-in request failed: {}", e);
                StorageError::Auth("Unable to reach the identity provider".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Password sign-in rejected with status {}", status);
            return Err(StorageError::Auth("Invalid login credentials".to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Auth(format!("Malformed token response: {}", e)))?;

        Ok(token.access_token)
    }
}
