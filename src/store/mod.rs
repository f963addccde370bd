//! # Record Store
//!
//! Persistence seam for lens records. Mutations are staged and only become visible to
//! `fetch_all` / `fetch` once `save` commits them.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: discard() drops staged mutations of a failed operation
//! - 1.1.0: Staged mutations committed by save()
//! - 1.0.0: Initial release

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::core::StorageError;
use crate::features::lenses::LensRecord;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every committed record, oldest first
    async fn fetch_all(&self) -> Result<Vec<LensRecord>, StorageError>;

    async fn fetch(&self, id: &str) -> Result<Option<LensRecord>, StorageError>;

    async fn insert(&self, record: &LensRecord) -> Result<(), StorageError>;

    async fn update(&self, record: &LensRecord) -> Result<(), StorageError>;

    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Commit every staged mutation
    async fn save(&self) -> Result<(), StorageError>;

    /// Drop every staged mutation without committing it
    async fn discard(&self);
}

/// A staged change waiting for `save`
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Insert(LensRecord),
    Update(LensRecord),
    Delete(String),
}
