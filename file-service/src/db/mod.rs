pub mod repository;

#[cfg(test)]
pub mod memory;

pub use repository::{FileRepository, PgFileRepository};
