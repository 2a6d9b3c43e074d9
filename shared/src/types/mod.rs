//! Shared type definitions used across backend services
//!
//! - `CommonError`: the cross-service error taxonomy and its HTTP status mapping
//! - `Paginated`: the page envelope returned by listing endpoints

pub mod error;
pub mod pagination;

pub use error::CommonError;
pub use pagination::Paginated;
