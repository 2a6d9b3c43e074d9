//! Shared utilities and types for the file metadata backend services

pub mod database;
pub mod observability;
pub mod types;

pub use types::{CommonError, Paginated};
