use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::{info, warn};

use super::AppJson;
use crate::error::ApiError;
use crate::models::{AccessTokenResponse, LoginRequest};
use crate::AppState;

/// Exchange email and password for the provider's access token.
/// Every failure is reported as the same 401; the cause is only logged.
pub async fn access_token(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    match state.storage.password_sign_in(&req.email, &req.password).await {
        Ok(access_token) => {
            info!("Password login succeeded");
            Ok(Json(AccessTokenResponse { access_token }))
        }
        Err(e) => {
            warn!(error = %e, "Password login failed");
            Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
    }
}
