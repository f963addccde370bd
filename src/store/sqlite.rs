//! SQLite record store.
//!
//! Records are kept as JSON payloads keyed by id. Staged mutations are applied in a
//! single transaction on `save`.

use async_trait::async_trait;
use log::{debug, error};
use sqlite::{Connection, State};
use std::path::Path;
use tokio::sync::Mutex;

use super::{Mutation, RecordStore};
use crate::core::StorageError;
use crate::features::lenses::LensRecord;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS lenses (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        payload TEXT NOT NULL
    );
";

pub struct SqliteStore {
    connection: Mutex<Connection>,
    staged: Mutex<Vec<Mutation>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let connection = sqlite::open(path)?;
        connection.execute(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
            staged: Mutex::new(Vec::new()),
        })
    }
}

fn read_records(
    connection: &Connection,
    id: Option<&str>,
) -> Result<Vec<LensRecord>, StorageError> {
    let mut statement = match id {
        Some(id) => {
            let mut statement = connection.prepare("SELECT payload FROM lenses WHERE id = ?")?;
            statement.bind((1, id))?;
            statement
        }
        None => connection.prepare("SELECT payload FROM lenses ORDER BY created_at ASC")?,
    };

    let mut records = Vec::new();
    while statement.next()? == State::Row {
        let payload = statement.read::<String, _>(0)?;
        records.push(serde_json::from_str(&payload)?);
    }
    Ok(records)
}

fn exists(connection: &Connection, id: &str) -> Result<bool, StorageError> {
    let mut statement = connection.prepare("SELECT 1 FROM lenses WHERE id = ?")?;
    statement.bind((1, id))?;
    Ok(statement.next()? == State::Row)
}

fn apply(connection: &Connection, mutation: &Mutation) -> Result<(), StorageError> {
    match mutation {
        Mutation::Insert(record) | Mutation::Update(record) => {
            let payload = serde_json::to_string(record)?;
            let created_at = record.created_at().to_rfc3339();
            let mut statement = connection.prepare(
                "INSERT OR REPLACE INTO lenses (id, created_at, payload) VALUES (?, ?, ?)",
            )?;
            statement.bind((1, record.id()))?;
            statement.bind((2, created_at.as_str()))?;
            statement.bind((3, payload.as_str()))?;
            while statement.next()? != State::Done {}
        }
        Mutation::Delete(id) => {
            let mut statement = connection.prepare("DELETE FROM lenses WHERE id = ?")?;
            statement.bind((1, id.as_str()))?;
            while statement.next()? != State::Done {}
        }
    }
    Ok(())
}

fn commit(connection: &Connection, mutations: &[Mutation]) -> Result<(), StorageError> {
    connection.execute("BEGIN")?;
    for mutation in mutations {
        if let Err(e) = apply(connection, mutation) {
            if let Err(rollback) = connection.execute("ROLLBACK") {
                error!("Rollback failed after {}: {}", e, rollback);
            }
            return Err(e);
        }
    }
    connection.execute("COMMIT")?;
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_all(&self) -> Result<Vec<LensRecord>, StorageError> {
        let connection = self.connection.lock().await;
        read_records(&connection, None)
    }

    async fn fetch(&self, id: &str) -> Result<Option<LensRecord>, StorageError> {
        let connection = self.connection.lock().await;
        Ok(read_records(&connection, Some(id))?.into_iter().next())
    }

    async fn insert(&self, record: &LensRecord) -> Result<(), StorageError> {
        let duplicate = {
            let connection = self.connection.lock().await;
            exists(&connection, record.id())?
        };
        if duplicate {
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
        let mutations: Vec<Mutation> = self.staged.lock().await.drain(..).collect();
        if mutations.is_empty() {
            return Ok(());
        }

        let connection = self.connection.lock().await;
        commit(&connection, &mutations)?;
        debug!("Committed {} lens mutations", mutations.len());
        Ok(())
    }

    async fn discard(&self) {
        let mut staged = self.staged.lock().await;
        if !staged.is_empty() {
            debug!("Discarded {} staged lens mutations", staged.len());
            staged.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lenses::{EyeSide, LensDraft, OpticalDetail, Sphere, WearDuration};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("lenses.db")).unwrap();
        (dir, store)
    }

    fn record(name: &str) -> LensRecord {
        let mut draft = LensDraft::new(name, EyeSide::Left, WearDuration::Biweekly);
        draft.sphere = Some(Sphere {
            left: Some(-1.75),
            right: None,
        });
        draft.optical_detail = Some(OpticalDetail {
            base_curve: Some(8.6),
            diameter: Some(14.2),
            brand: Some("Acuvue".to_string()),
            ..Default::default()
        });
        LensRecord::new(draft, date(2024, 1, 1))
    }

    #[tokio::test]
    async fn test_round_trip_with_optics() {
        let (_dir, store) = open_temp();
        let lens = record("Oasys");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();

        let loaded = store.fetch(lens.id()).await.unwrap().unwrap();
        assert_eq!(loaded, lens);
        assert_eq!(loaded.change_date(), date(2024, 1, 15));
    }

    #[tokio::test]
    async fn test_staged_mutations_invisible_until_save() {
        let (_dir, store) = open_temp();
        let lens = record("Oasys");
        store.insert(&lens).await.unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());

        store.save().await.unwrap();
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let (_dir, store) = open_temp();
        let mut lens = record("Oasys");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();

        lens.set_start_date(date(2024, 2, 1));
        store.update(&lens).await.unwrap();
        store.save().await.unwrap();
        let loaded = store.fetch(lens.id()).await.unwrap().unwrap();
        assert_eq!(loaded.change_date(), date(2024, 2, 15));

        store.delete(lens.id()).await.unwrap();
        store.save().await.unwrap();
        assert!(store.fetch(lens.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let (_dir, store) = open_temp();
        let lens = record("Oasys");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();
        assert!(matches!(
            store.insert(&lens).await,
            Err(StorageError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_discard_drops_staged() {
        let (_dir, store) = open_temp();
        store.insert(&record("Oasys")).await.unwrap();
        store.discard().await;
        store.save().await.unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_whole_batch() {
        let (_dir, store) = open_temp();
        {
            let connection = store.connection.lock().await;
            connection
                .execute(
                    "CREATE TRIGGER reject_ghost BEFORE INSERT ON lenses
                     WHEN NEW.payload LIKE '%Ghost%'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
                .unwrap();
        }

        store.insert(&record("Oasys")).await.unwrap();
        store.insert(&record("Ghost")).await.unwrap();
        assert!(store.save().await.is_err());
        assert!(store.fetch_all().await.unwrap().is_empty());

        // The connection is usable again after the rollback
        let lens = record("Oasys");
        store.insert(&lens).await.unwrap();
        store.save().await.unwrap();
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lenses.db");
        let lens = record("Oasys");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&lens).await.unwrap();
            store.save().await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), lens.id());
    }
}
