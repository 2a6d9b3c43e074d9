use async_trait::async_trait;
use chrono::Utc;
use shared::database::DbPool;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{CreateFileRequest, FileRecord, ListFilesQuery, UpdateFileRequest};

const FILE_COLUMNS: &str = "id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id";

/// Persistence gateway for file records
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a new record owned by `owner_id`
    async fn create(&self, owner_id: Uuid, request: CreateFileRequest) -> Result<FileRecord, sqlx::Error>;

    /// One page of records plus the number of records matching the filter
    async fn list(&self, query: &ListFilesQuery) -> Result<(Vec<FileRecord>, i64), sqlx::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, sqlx::Error>;

    /// Apply the supplied fields. `None` when the record does not exist.
    async fn update(&self, id: Uuid, update: UpdateFileRequest) -> Result<Option<FileRecord>, sqlx::Error>;

    /// Remove a record. `false` when the record does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    async fn is_healthy(&self) -> bool;
}

/// PostgreSQL-backed repository. Every call holds one pooled connection for its
/// duration; the guard hands it back to the pool when dropped.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: DbPool,
}

impl PgFileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create(&self, owner_id: Uuid, request: CreateFileRequest) -> Result<FileRecord, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (
                id,
                storage_path,
                name,
                size,
                mime_type,
                uploaded_at,
                created_at,
                owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.storage_path)
        .bind(request.name)
        .bind(request.size)
        .bind(request.mime_type)
        .bind(request.uploaded_at)
        .bind(Utc::now())
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!("Created file record: id={}, owner={}", file.id, owner_id);
        Ok(file)
    }

    async fn list(&self, query: &ListFilesQuery) -> Result<(Vec<FileRecord>, i64), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let (total,) = build_count_query(query)
            .build_query_as::<(i64,)>()
            .fetch_one(&mut *conn)
            .await?;

        let files = build_list_query(query)
            .build_query_as::<FileRecord>()
            .fetch_all(&mut *conn)
            .await?;

        Ok((files, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(file)
    }

    async fn update(&self, id: Uuid, update: UpdateFileRequest) -> Result<Option<FileRecord>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            UPDATE files
            SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id
            "#,
        )
        .bind(id)
        .bind(update.name)
        .fetch_optional(&mut *conn)
        .await?;

        if file.is_some() {
            tracing::info!("Updated file record {}", id);
        }
        Ok(file)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Deleted file record {}", id);
        }
        Ok(deleted)
    }

    async fn is_healthy(&self) -> bool {
        shared::database::health_check(&self.pool).await
    }
}

fn push_owner_filter(builder: &mut QueryBuilder<'static, Postgres>, owner_id: Option<Uuid>) {
    if let Some(owner_id) = owner_id {
        builder.push(" WHERE owner_id = ").push_bind(owner_id);
    }
}

/// `SELECT COUNT(*)` over the filter only; the window never affects the total
pub(crate) fn build_count_query(query: &ListFilesQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM files");
    push_owner_filter(&mut builder, query.owner_id);
    builder
}

/// Filtered, sorted and windowed listing. Column names come from the `SortField`
/// whitelist, never from the request. `id` is the final tie-break so pages are stable.
pub(crate) fn build_list_query(query: &ListFilesQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM files", FILE_COLUMNS));
    push_owner_filter(&mut builder, query.owner_id);

    builder.push(" ORDER BY ");
    for key in &query.sort {
        builder
            .push(key.field.column())
            .push(" ")
            .push(key.direction.as_sql())
            .push(", ");
    }
    builder.push("id ASC");

    builder
        .push(" LIMIT ")
        .push_bind(query.limit())
        .push(" OFFSET ")
        .push_bind(query.offset());

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, SortField, SortKey};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_list_query() {
        let builder = build_list_query(&ListFilesQuery::default());
        assert_eq!(
            builder.sql(),
            "SELECT id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id FROM files \
             ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_multi_key_sort_with_owner_filter() {
        let query = ListFilesQuery {
            owner_id: Some(Uuid::new_v4()),
            sort: vec![
                SortKey::new(SortField::Name, SortDirection::Asc),
                SortKey::new(SortField::Size, SortDirection::Desc),
            ],
            page: 2,
            page_size: 25,
        };

        let builder = build_list_query(&query);
        assert_eq!(
            builder.sql(),
            "SELECT id, storage_path, name, size, mime_type, uploaded_at, created_at, owner_id FROM files \
             WHERE owner_id = $1 ORDER BY name ASC, size DESC, id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_count_query_ignores_window_and_sort() {
        let mut query = ListFilesQuery::from_pairs([
            ("sort_by", "size"),
            ("page", "7"),
            ("page_size", "3"),
        ])
        .unwrap();
        assert_eq!(build_count_query(&query).sql(), "SELECT COUNT(*) FROM files");

        query.owner_id = Some(Uuid::new_v4());
        assert_eq!(
            build_count_query(&query).sql(),
            "SELECT COUNT(*) FROM files WHERE owner_id = $1"
        );
    }

    #[test]
    fn test_request_values_never_reach_sql_text() {
        let query = ListFilesQuery::from_pairs([
            ("sort_by", "name; DROP TABLE files"),
            ("sort_order", "asc"),
        ])
        .unwrap();

        let builder = build_list_query(&query);
        assert!(!builder.sql().contains("DROP"));
        assert!(builder.sql().contains("ORDER BY created_at ASC, id ASC"));
    }
}
