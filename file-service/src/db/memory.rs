use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::FileRepository;
use crate::models::{CreateFileRequest, FileRecord, ListFilesQuery, SortDirection, SortField, SortKey, UpdateFileRequest};

/// In-process repository for router tests. Ordering follows PostgreSQL:
/// NULL compares greater than every value.
pub struct InMemoryFileRepository {
    files: Mutex<Vec<FileRecord>>,
    healthy: Mutex<bool>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            healthy: Mutex::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }

    pub fn insert(&self, record: FileRecord) {
        self.files.lock().unwrap().push(record);
    }
}

fn nulls_last(a: &Option<f64>, b: &Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare(a: &FileRecord, b: &FileRecord, key: &SortKey) -> Ordering {
    let ordering = match key.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Size => nulls_last(&a.size, &b.size),
    };
    match key.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn create(&self, owner_id: Uuid, request: CreateFileRequest) -> Result<FileRecord, sqlx::Error> {
        let record = FileRecord {
            id: Uuid::new_v4(),
            storage_path: request.storage_path,
            name: request.name,
            size: request.size,
            mime_type: request.mime_type,
            uploaded_at: request.uploaded_at,
            created_at: Utc::now(),
            owner_id: Some(owner_id),
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &ListFilesQuery) -> Result<(Vec<FileRecord>, i64), sqlx::Error> {
        let mut matching: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| query.owner_id.is_none() || f.owner_id == query.owner_id)
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| compare(a, b, key))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, sqlx::Error> {
        Ok(self.files.lock().unwrap().iter().find(|f| f.id == id).cloned())
    }

    async fn update(&self, id: Uuid, update: UpdateFileRequest) -> Result<Option<FileRecord>, sqlx::Error> {
        let mut files = self.files.lock().unwrap();
        let Some(record) = files.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            record.name = name;
        }
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        Ok(files.len() < before)
    }

    async fn is_healthy(&self) -> bool {
        *self.healthy.lock().unwrap()
    }
}
