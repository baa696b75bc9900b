//! Storage layer for maintrack.
//!
//! This module provides the key-value adapter every collection goes through:
//! a named JSON value per key, kept in one `SQLite` table. Collections are
//! always read and written whole.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CorruptPolicy;
use crate::error::{Error, Result};

/// Persistent key-value store for collection values.
///
/// Every value is stored as JSON text. Plain reads that fail to decode follow
/// the configured [`CorruptPolicy`]; loads inside a [`Batch`] always fail, so
/// undecodable text is never replaced by a read-modify-write.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Reaction to undecodable stored values.
    on_corrupt: CorruptPolicy,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            on_corrupt: CorruptPolicy::default(),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            on_corrupt: CorruptPolicy::default(),
        })
    }

    /// Set how undecodable stored values are handled.
    #[must_use]
    pub fn with_corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the value stored under `key`, or `default` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptRecord` if the stored text does not decode and
    /// the policy is [`CorruptPolicy::Fail`], or an error if the query fails.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        load_value(&self.conn, self.on_corrupt, key, default)
    }

    /// Serialize `value` and store it under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        save_value(&self.conn, key, value)
    }

    /// Store raw text under `key` without checking that it is JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_raw(&self, key: &str, text: &str) -> Result<()> {
        set_raw(&self.conn, key, text)
    }

    /// Delete the value under `key`. Returns `true` if a value was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM records WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// All stored keys in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM records ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// When `key` was last written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM records WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stamp.as_deref().and_then(parse_timestamp))
    }

    /// Run `f` against the store inside one immediate transaction.
    ///
    /// The transaction takes the database write lock up front, so a
    /// load-modify-save sequence cannot interleave with another writer.
    /// Nothing is committed if `f` returns an error.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or an error if the transaction fails.
    pub fn batch<R>(&mut self, f: impl FnOnce(&Batch<'_>) -> Result<R>) -> Result<R> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let batch = Batch { tx };
        let out = f(&batch)?;
        batch.tx.commit()?;
        Ok(out)
    }

    /// Load the value under `key`, let `f` modify it, and save it back atomically.
    ///
    /// If `f` fails, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptRecord` if the stored text does not decode,
    /// regardless of policy. Otherwise returns the error from `f`, or any
    /// load, save or transaction error.
    pub fn update<T, R>(
        &mut self,
        key: &str,
        default: T,
        f: impl FnOnce(&mut T) -> Result<R>,
    ) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
    {
        self.batch(|batch| {
            let mut value = batch.load(key, default)?;
            let out = f(&mut value)?;
            batch.save(key, &value)?;
            Ok(out)
        })
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_keys: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM records ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_keys,
            last_updated: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }
}

/// Load and save access within a [`Storage::batch`] transaction.
#[derive(Debug)]
pub struct Batch<'conn> {
    tx: Transaction<'conn>,
}

impl Batch<'_> {
    /// Load the value under `key` for modification, or `default` when absent.
    ///
    /// Unlike [`Storage::load`] this never falls back: saving a default over
    /// undecodable text would destroy it.
    ///
    /// # Errors
    ///
    /// Returns `Error::CorruptRecord` if the stored text does not decode, or
    /// an error if the query fails.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        load_value(&self.tx, CorruptPolicy::Fail, key, default)
    }

    /// Same as [`Storage::save`], inside the transaction.
    ///
    /// # Errors
    ///
    /// See [`Storage::save`].
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        save_value(&self.tx, key, value)
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored keys.
    pub total_keys: i64,
    /// Most recent write to any key.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn get_raw(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn set_raw(conn: &Connection, key: &str, text: &str) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        ",
        params![key, text, Utc::now().to_rfc3339()],
    )?;
    debug!(key, bytes = text.len(), "Stored value");
    Ok(())
}

fn load_value<T: DeserializeOwned>(
    conn: &Connection,
    policy: CorruptPolicy,
    key: &str,
    default: T,
) -> Result<T> {
    let Some(text) = get_raw(conn, key)? else {
        return Ok(default);
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(source) => match policy {
            CorruptPolicy::Fallback => {
                warn!(key, error = %source, "Stored value is corrupt, using empty default");
                Ok(default)
            }
            CorruptPolicy::Fail => Err(Error::corrupt_record(key, source)),
        },
    }
}

fn save_value<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    set_raw(conn, key, &text)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_load_missing_returns_default() {
        let storage = create_test_storage();
        let value: Vec<String> = storage.load("equipos", Vec::new()).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let storage = create_test_storage();
        storage.save("tareas", &vec!["a", "b"]).unwrap();

        let value: Vec<String> = storage.load("tareas", Vec::new()).unwrap();
        assert_eq!(value, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_save_replaces_whole_value() {
        let storage = create_test_storage();
        storage.save("ots", &vec![1, 2, 3]).unwrap();
        storage.save("ots", &vec![9]).unwrap();

        let value: Vec<i32> = storage.load("ots", Vec::new()).unwrap();
        assert_eq!(value, vec![9]);
    }

    #[test]
    fn test_corrupt_value_falls_back_by_default() {
        crate::logging::init_test_logging();
        let storage = create_test_storage();
        storage.set_raw("equipos", "{not json").unwrap();

        let value: Vec<String> = storage.load("equipos", Vec::new()).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_corrupt_value_fails_when_configured() {
        let storage = create_test_storage().with_corrupt_policy(CorruptPolicy::Fail);
        storage.set_raw("equipos", "{not json").unwrap();

        let err = storage.load::<Vec<String>>("equipos", Vec::new()).unwrap_err();
        assert!(err.is_corrupt_record());
        assert!(err.to_string().contains("equipos"));
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let storage = create_test_storage().with_corrupt_policy(CorruptPolicy::Fail);
        storage.set_raw("checklist", "[1, 2]").unwrap();

        let result = storage.load::<std::collections::BTreeMap<String, Vec<String>>>(
            "checklist",
            std::collections::BTreeMap::new(),
        );
        assert!(matches!(result, Err(Error::CorruptRecord { .. })));
    }

    #[test]
    fn test_remove() {
        let storage = create_test_storage();
        storage.save("ots", &Vec::<String>::new()).unwrap();

        assert!(storage.remove("ots").unwrap());
        assert!(!storage.remove("ots").unwrap());
        assert!(get_raw(&storage.conn, "ots").unwrap().is_none());
    }

    #[test]
    fn test_keys_sorted() {
        let storage = create_test_storage();
        storage.save("tareas", &0).unwrap();
        storage.save("equipos", &0).unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["equipos", "tareas"]);
    }

    #[test]
    fn test_updated_at() {
        let storage = create_test_storage();
        assert!(storage.updated_at("equipos").unwrap().is_none());

        let before = Utc::now();
        storage.save("equipos", &0).unwrap();
        let stamp = storage.updated_at("equipos").unwrap().unwrap();
        assert!(stamp >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_update_appends() {
        let mut storage = create_test_storage();
        for word in ["one", "two", "three"] {
            storage
                .update("tareas", Vec::<String>::new(), |list| {
                    list.push(word.to_string());
                    Ok(())
                })
                .unwrap();
        }

        let value: Vec<String> = storage.load("tareas", Vec::new()).unwrap();
        assert_eq!(value, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_update_error_writes_nothing() {
        let mut storage = create_test_storage();
        storage.save("tareas", &vec!["kept"]).unwrap();

        let result: Result<()> = storage.update("tareas", Vec::<String>::new(), |list| {
            list.push("lost".to_string());
            Err(Error::EmptyPrerequisite { record: "task" })
        });
        assert!(result.is_err());

        let value: Vec<String> = storage.load("tareas", Vec::new()).unwrap();
        assert_eq!(value, vec!["kept"]);
    }

    #[test]
    fn test_batch_rolls_back_all_keys() {
        let mut storage = create_test_storage();
        storage.save("equipos", &vec!["old"]).unwrap();

        let result: Result<()> = storage.batch(|batch| {
            batch.save("equipos", &vec!["new"])?;
            batch.save("tareas", &vec!["new"])?;
            Err(Error::DatabaseMigration {
                message: "forced failure".to_string(),
            })
        });
        assert!(result.is_err());

        let equipos: Vec<String> = storage.load("equipos", Vec::new()).unwrap();
        assert_eq!(equipos, vec!["old"]);
        assert!(get_raw(&storage.conn, "tareas").unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let empty = storage.stats().unwrap();
        assert_eq!(empty.total_keys, 0);
        assert!(empty.last_updated.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        storage.save("equipos", &0).unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_keys, 1);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("records.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage.save("equipos", &vec!["Pump-1"]).unwrap();
            assert_eq!(storage.path(), db_path);
        }

        let reopened = Storage::open(&db_path).unwrap();
        let value: Vec<String> = reopened.load("equipos", Vec::new()).unwrap();
        assert_eq!(value, vec!["Pump-1"]);
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_update_keeps_corrupt_value() {
        let mut storage = create_test_storage();
        storage.set_raw("tareas", "{not json").unwrap();

        let err = storage
            .update("tareas", Vec::<String>::new(), |list| {
                list.push("lost".to_string());
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_corrupt_record());
        assert_eq!(
            get_raw(&storage.conn, "tareas").unwrap().as_deref(),
            Some("{not json")
        );

        // Plain reads still follow the fallback policy.
        let value: Vec<String> = storage.load("tareas", Vec::new()).unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_batch_holds_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("records.db");
        let mut storage = Storage::open(&db_path).unwrap();
        storage.save("equipos", &vec!["Pump-1"]).unwrap();

        let other = Connection::open(&db_path).unwrap();
        other.busy_timeout(std::time::Duration::ZERO).unwrap();

        storage
            .batch(|batch| {
                let mut list: Vec<String> = batch.load("equipos", Vec::new())?;
                list.push("Boiler".to_string());

                let err = other.execute_batch("BEGIN IMMEDIATE").unwrap_err();
                assert_eq!(err.sqlite_error_code(), Some(rusqlite::ErrorCode::DatabaseBusy));

                batch.save("equipos", &list)
            })
            .unwrap();

        other.execute_batch("BEGIN IMMEDIATE; COMMIT;").unwrap();
        let seen: String = other
            .query_row("SELECT value FROM records WHERE key = 'equipos'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(seen, r#"["Pump-1","Boiler"]"#);
    }

    #[test]
    fn test_updates_from_two_handles_keep_every_append() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("records.db");
        let mut first = Storage::open(&db_path).unwrap();
        let mut second = Storage::open(&db_path).unwrap();

        for i in 0..4 {
            let handle = if i % 2 == 0 { &mut first } else { &mut second };
            handle
                .update("ots", Vec::<i32>::new(), |list| {
                    list.push(i);
                    Ok(())
                })
                .unwrap();
        }

        let value: Vec<i32> = first.load("ots", Vec::new()).unwrap();
        assert_eq!(value, vec![0, 1, 2, 3]);
    }
}
