//! Namespaced key→value persistence for library records.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage. Records live in
//! collections (`tracks`, `history`, `playlists`) as serde_json blobs keyed
//! by record id; the store offers `get`/`set`/`delete` plus full-collection
//! enumeration, and nothing else. There are no transactions across
//! collections — multi-collection updates (the delete cascade) are
//! sequential best-effort writes, and readers filter dangling references.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::error::Result;

/// Default database filename inside the app data directory.
pub const DEFAULT_DB_NAME: &str = "music_keeper.db";

/// Collection names used by the core.
pub mod collections {
    pub const TRACKS: &str = "tracks";
    pub const HISTORY: &str = "history";
    pub const PLAYLISTS: &str = "playlists";
}

/// Handle to the persistent store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if necessary) the store at the given file path.
    pub async fn open(path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}", path.display());

        if !sqlx::Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(&db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Fetch and decode a single record, or `None` if the key is absent.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<Option<T>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM records WHERE collection = ? AND key = ?")
                .bind(collection)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a record.
    pub async fn set<T: Serialize>(&self, collection: &str, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO records (collection, key, value) VALUES (?, ?, ?)
            ON CONFLICT(collection, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(encoded)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a record. Deleting an absent key is not an error.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM records WHERE collection = ? AND key = ?")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Decode every record in a collection. Insertion order by key is not
    /// guaranteed; callers that care about order keep it inside the record.
    pub async fn all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT value FROM records WHERE collection = ? ORDER BY key")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (value,) in rows {
            out.push(serde_json::from_str(&value)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    async fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.db")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let (store, _dir) = temp_store().await;

        let sample = Sample {
            name: "one".to_string(),
            count: 1,
        };
        store.set("things", "a", &sample).await.unwrap();

        let back: Option<Sample> = store.get("things", "a").await.unwrap();
        assert_eq!(back, Some(sample));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (store, _dir) = temp_store().await;
        let missing: Option<Sample> = store.get("things", "nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_existing() {
        let (store, _dir) = temp_store().await;

        store
            .set(
                "things",
                "a",
                &Sample {
                    name: "old".to_string(),
                    count: 1,
                },
            )
            .await
            .unwrap();
        store
            .set(
                "things",
                "a",
                &Sample {
                    name: "new".to_string(),
                    count: 2,
                },
            )
            .await
            .unwrap();

        let back: Option<Sample> = store.get("things", "a").await.unwrap();
        assert_eq!(back.unwrap().name, "new");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let (store, _dir) = temp_store().await;

        let sample = Sample {
            name: "x".to_string(),
            count: 0,
        };
        store.set("left", "a", &sample).await.unwrap();

        let other: Option<Sample> = store.get("right", "a").await.unwrap();
        assert!(other.is_none());

        let left: Vec<Sample> = store.all("left").await.unwrap();
        let right: Vec<Sample> = store.all("right").await.unwrap();
        assert_eq!(left.len(), 1);
        assert!(right.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _dir) = temp_store().await;

        store
            .set(
                "things",
                "a",
                &Sample {
                    name: "x".to_string(),
                    count: 0,
                },
            )
            .await
            .unwrap();
        store.delete("things", "a").await.unwrap();
        store.delete("things", "a").await.unwrap(); // second delete is fine

        let back: Option<Sample> = store.get("things", "a").await.unwrap();
        assert!(back.is_none());
    }
}
