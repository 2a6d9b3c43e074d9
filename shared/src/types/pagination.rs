use serde::{Deserialize, Serialize};

/// One page of a listing plus the size of the full, unwindowed result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            data,
            total,
            page,
            page_size,
        }
    }
}

/// Zero-based row offset of a 1-indexed page
pub fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 25), 50);
        assert_eq!(page_offset(0, 10), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let response = Paginated::new(vec!["a"], 1, 1, 10);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": ["a"], "total": 1, "page": 1, "page_size": 10})
        );
    }
}
