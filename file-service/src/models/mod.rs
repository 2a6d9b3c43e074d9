use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A stored file record. The binary object itself lives in external storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub storage_path: Option<String>,
    pub name: String,
    pub size: Option<f64>,
    pub mime_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
}

/// Request payload for creating a file record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub storage_path: Option<String>,
    pub size: Option<f64>,
    pub mime_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Partial update: only the fields that are present are applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFileRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub signed_url: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

// ============= Listing =============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Name,
    Size,
}

impl SortField {
    /// Unrecognised keys sort by creation time.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => SortField::Name,
            "size" => SortField::Size,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name",
            SortField::Size => "size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(QueryError::InvalidSortOrder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Pairs the i-th field with the i-th direction. Fields without a direction sort descending;
/// surplus directions are ignored. No fields at all means newest first.
pub fn pair_sort_keys(fields: &[SortField], directions: &[SortDirection]) -> Vec<SortKey> {
    if fields.is_empty() {
        return vec![SortKey::new(SortField::CreatedAt, SortDirection::Desc)];
    }

    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let direction = directions.get(i).copied().unwrap_or(SortDirection::Desc);
            SortKey::new(*field, direction)
        })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("page must be an integer greater than or equal to 1, got '{0}'")]
    InvalidPage(String),

    #[error("page_size must be an integer between 1 and 100, got '{0}'")]
    InvalidPageSize(String),

    #[error("sort_order must be 'asc' or 'desc', got '{0}'")]
    InvalidSortOrder(String),

    #[error("user_id must be a UUID, got '{0}'")]
    InvalidUserId(String),
}

/// Validated listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilesQuery {
    pub owner_id: Option<Uuid>,
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListFilesQuery {
    fn default() -> Self {
        Self {
            owner_id: None,
            sort: pair_sort_keys(&[], &[]),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilesQuery {
    /// Builds the query from raw query-string pairs. `sort_by` and `sort_order` may repeat;
    /// unknown parameters are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        let mut fields = Vec::new();
        let mut directions = Vec::new();

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "user_id" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        let owner_id = Uuid::parse_str(value)
                            .map_err(|_| QueryError::InvalidUserId(value.to_string()))?;
                        query.owner_id = Some(owner_id);
                    }
                }
                "sort_by" => fields.push(SortField::parse_or_default(value)),
                "sort_order" => directions.push(value.parse::<SortDirection>()?),
                "page" => {
                    query.page = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|page| *page >= 1)
                        .ok_or_else(|| QueryError::InvalidPage(value.to_string()))?;
                }
                "page_size" => {
                    query.page_size = value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                        .ok_or_else(|| QueryError::InvalidPageSize(value.to_string()))?;
                }
                _ => {}
            }
        }

        query.sort = pair_sort_keys(&fields, &directions);
        Ok(query)
    }

    pub fn offset(&self) -> i64 {
        shared::types::pagination::page_offset(self.page, self.page_size) as i64
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}
