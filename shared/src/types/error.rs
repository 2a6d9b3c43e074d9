//! Common error types shared by the backend services

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommonError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            CommonError::InvalidInput(_) => 400,
            CommonError::AuthenticationFailed(_) => 401,
            CommonError::NotFound(_) => 404,
            CommonError::ValidationFailed(_) => 422,
            _ => 500,
        }
    }

    /// Whether the message is safe to return to the caller verbatim
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, CommonError::Database(_) | CommonError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(CommonError::NotFound("test".to_string()).http_status_code(), 404);
        assert_eq!(CommonError::AuthenticationFailed("test".to_string()).http_status_code(), 401);
        assert_eq!(CommonError::InvalidInput("test".to_string()).http_status_code(), 400);
        assert_eq!(CommonError::ValidationFailed("test".to_string()).http_status_code(), 422);
        assert_eq!(CommonError::ExternalService("test".to_string()).http_status_code(), 500);
        assert_eq!(CommonError::Configuration("test".to_string()).http_status_code(), 500);
    }

    #[test]
    fn test_client_visibility() {
        assert!(CommonError::NotFound("test".to_string()).is_client_visible());
        assert!(CommonError::ExternalService("test".to_string()).is_client_visible());
        assert!(!CommonError::Database("test".to_string()).is_client_visible());
        assert!(!CommonError::Internal("test".to_string()).is_client_visible());
    }
}
