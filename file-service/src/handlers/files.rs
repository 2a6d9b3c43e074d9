use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use shared::Paginated;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{AppJson, AppPath, AppQuery};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::*;
use crate::AppState;

/// Lifetime of generated download links, in seconds
pub const DOWNLOAD_URL_EXPIRY_SECONDS: u64 = 3600;

/// Create a file record owned by the caller
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(req): AppJson<CreateFileRequest>,
) -> Result<(StatusCode, Json<FileRecord>), ApiError> {
    let file = state.files.create(user.id, req).await?;
    info!(file_id = %file.id, owner_id = %user.id, "File record created");
    Ok((StatusCode::CREATED, Json(file)))
}

/// List file records with optional owner filter, multi-key sort and pagination
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<Json<Paginated<FileRecord>>, ApiError> {
    let query = ListFilesQuery::from_pairs(params)?;
    let (files, total) = state.files.list(&query).await?;

    debug!(
        returned = files.len(),
        total,
        page = query.page,
        page_size = query.page_size,
        "Listed file records"
    );

    Ok(Json(Paginated::new(
        files,
        total.max(0) as u64,
        query.page,
        query.page_size,
    )))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<FileRecord>, ApiError> {
    let file = state.files.get(id).await?.ok_or(ApiError::NotFound(id))?;
    debug!(file_id = %id, "Fetched file record");
    Ok(Json(file))
}

/// Apply a partial update; only `name` is mutable
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateFileRequest>,
) -> Result<Json<FileRecord>, ApiError> {
    let file = state.files.update(id, req).await?.ok_or(ApiError::NotFound(id))?;
    info!(file_id = %id, "File record updated");
    Ok(Json(file))
}

/// Delete a file record. The stored object is left in place.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.files.delete(id).await? {
        return Err(ApiError::NotFound(id));
    }
    info!(file_id = %id, "File record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a time-limited download link for the record's stored object
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DownloadLink>, ApiError> {
    let file = state.files.get(id).await?.ok_or(ApiError::NotFound(id))?;

    let storage_path = file
        .storage_path
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("File does not have a storage path".to_string()))?;

    let signed_url = state
        .storage
        .sign_url(storage_path, DOWNLOAD_URL_EXPIRY_SECONDS)
        .await
        .map_err(|e| {
            error!(file_id = %id, error = %e, "Failed to sign download url");
            ApiError::Internal(format!("Failed to generate signed URL: {}", e))
        })?;

    Ok(Json(DownloadLink {
        signed_url,
        filename: file.name,
    }))
}
