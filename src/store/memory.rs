//! In-memory record store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{Mutation, RecordStore};
use crate::core::StorageError;
use crate::features::lenses::LensRecord;

#[derive(Default)]
pub struct MemoryStore {
    committed: DashMap<String, LensRecord>,
    staged: Mutex<Vec<Mutation>>,
    fail_save: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<LensRecord>, StorageError> {
        let mut records: Vec<LensRecord> = self.committed.iter().map(|r| r.clone()).collect();
        records.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(records)
    }

    async fn fetch(&self, id: &str) -> Result<Option<LensRecord>, StorageError> {
        Ok(self.committed.get(id).map(|r| r.clone()))
    }

    async fn insert(&self, record: &LensRecord) -> Result<(), StorageError> {
        if self.committed.contains_key(record.id()) {
            return Err(StorageError::Duplicate(record.id().to_string()));
        }
        self.staged.lock().await.push(Mutation::Insert(record.clone()));
        Ok(())
    }

    async fn update(&self, record: &LensRecord) -> Result<(), StorageError> {
        self.staged.lock().await.push(Mutation::Update(record.clone()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.staged.lock().await.push(Mutation::Delete(id.to_string()));
        Ok(())
    }

    async fn save(&self) -> Result<(), StorageError> {
        let mut staged = self.staged.lock().await;
        if self.fail_save.load(Ordering::SeqCst) {
            staged.clear();
            return Err(StorageError::Backend("save rejected".to_string()));
        }

        for mutation in staged.drain(..) {
            match mutation {
                Mutation::Insert(record) | Mutation::Update(record) => {
                    self.committed.insert(record.id().to_string(), record);
                }
                Mutation::Delete(id) => {
                    self.committed.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn discard(&self) {
        self.staged.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lenses::{EyeSide, LensDraft, WearDuration};
    use chrono::NaiveDate;

    fn record(name: &str) -> LensRecord {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        LensRecord::new(
            LensDraft::new(name, EyeSide::Both, WearDuration::Monthly),
            today,
        )
    }

    #[tokio::test]
    async fn test_staged_until_save() {
        let store = MemoryStore::new();
        let lens = record("A");
        store.insert(&lens).await.unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());

        store.save().await.unwrap();
        assert_eq!(store.fetch(lens.id()).await.unwrap(), Some(lens));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let mut lens = record("A");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();

        lens.name = "B".to_string();
        store.update(&lens).await.unwrap();
        store.save().await.unwrap();
        assert_eq!(store.fetch(lens.id()).await.unwrap().unwrap().name, "B");

        store.delete(lens.id()).await.unwrap();
        store.save().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let lens = record("A");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();
        assert!(matches!(
            store.insert(&lens).await,
            Err(StorageError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_discard_drops_staged() {
        let store = MemoryStore::new();
        store.insert(&record("A")).await.unwrap();
        store.discard().await;

        store.save().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_discards_staged() {
        let store = MemoryStore::new();
        store.set_fail_save(true);
        store.insert(&record("A")).await.unwrap();
        assert!(store.save().await.is_err());

        store.set_fail_save(false);
        store.save().await.unwrap();
        assert!(store.is_empty());
    }
}
