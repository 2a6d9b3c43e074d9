use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::CommonError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::QueryError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File with id {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Validation(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<&ApiError> for CommonError {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::NotFound(_) => CommonError::NotFound(err.to_string()),
            ApiError::BadRequest(msg) => CommonError::InvalidInput(msg.clone()),
            ApiError::Validation(msg) => CommonError::ValidationFailed(msg.clone()),
            ApiError::Unauthorized(msg) => CommonError::AuthenticationFailed(msg.clone()),
            ApiError::Storage(e @ StorageError::Auth(_)) => CommonError::AuthenticationFailed(e.to_string()),
            ApiError::Storage(e @ (StorageError::NotInitialized | StorageError::MissingCredentials)) => {
                CommonError::Configuration(e.to_string())
            }
            ApiError::Storage(e @ StorageError::Http(_)) => CommonError::Internal(e.to_string()),
            ApiError::Storage(e) => CommonError::ExternalService(e.to_string()),
            ApiError::Database(e) => CommonError::Database(e.to_string()),
            ApiError::Internal(msg) => CommonError::ExternalService(msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let common = CommonError::from(&self);
        let status = StatusCode::from_u16(common.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if common.is_client_visible() {
            self.to_string()
        } else {
            tracing::error!("Internal error: {}", common);
            "Internal server error".to_string()
        };

        if status.is_server_error() && common.is_client_visible() {
            tracing::error!("Request failed: {}", message);
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
