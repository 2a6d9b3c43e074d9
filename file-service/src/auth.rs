use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Identity of the caller, resolved by the storage provider from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let id = state.storage.verify(token).await?;
        tracing::debug!(user_id = %id, "Caller authenticated");
        Ok(Self { id })
    }
}

/// Extract the token from an `Authorization: Bearer {token}` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized("Invalid authentication credentials".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(ApiError::Unauthorized(_))));
        assert!(matches!(bearer_token(&headers("Bearer")), Err(ApiError::Unauthorized(_))));
        assert!(matches!(bearer_token(&headers("Bearer  ")), Err(ApiError::Unauthorized(_))));
        assert!(matches!(bearer_token(&headers("Basic dXNlcjpwdw==")), Err(ApiError::Unauthorized(_))));
    }
}
