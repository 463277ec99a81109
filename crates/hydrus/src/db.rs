//! Read-only connection pool over the four Hydrus database files.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// File index, services and per-file metadata.
pub(crate) const MAIN_FILE: &str = "client.db";
/// Auxiliary files, attached to every connection under a schema name.
pub(crate) const ATTACHED_FILES: [(&str, &str); 3] = [
    ("client.mappings.db", "mappings"),
    ("client.master.db", "master"),
    ("client.caches.db", "caches"),
];
const MAX_CONNECTIONS: u32 = 4;

#[derive(Debug, Clone)]
pub(crate) struct Database {
    pool: SqlitePool,
    base: PathBuf,
}

impl Database {
    /// Open the database files in `base`.
    ///
    /// Connections are read-only and see all four files as one database, so
    /// a single statement can join across them.
    #[instrument(level = "debug")]
    pub async fn open(base: &Path) -> Result<Self> {
        let base = std::path::absolute(base).or_raise(|| ErrorKind::MissingFile(base.to_path_buf()))?;
        let main = base.join(MAIN_FILE);
        for path in std::iter::once(main.clone()).chain(ATTACHED_FILES.iter().map(|(file, _)| base.join(file))) {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path));
            }
        }
        let options = SqliteConnectOptions::new().filename(&main).read_only(true);
        let attach_from = base.clone();
        let pool = SqlitePoolOptions::new()
            // Every pooled connection needs its own ATTACHes, not just the first.
            .after_connect(move |conn, _meta| {
                let base = attach_from.clone();
                Box::pin(async move { Self::prepare(conn, &base).await })
            })
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        debug!(path = %base.display(), "opened hydrus database");
        Ok(Self { pool, base })
    }

    async fn prepare(conn: &mut SqliteConnection, base: &Path) -> sqlx::Result<()> {
        for (file, schema) in ATTACHED_FILES {
            let path = base.join(file);
            sqlx::query(&format!("ATTACH DATABASE ? AS {schema}"))
                .bind(path.to_string_lossy().into_owned())
                .execute(&mut *conn)
                .await?;
        }
        sqlx::query(
            r#"
                PRAGMA query_only = ON;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
                PRAGMA mmap_size = 33554432;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Begin a read transaction that already holds a read lock on every file.
    pub async fn snapshot(&self) -> Result<Transaction<'static, Sqlite>> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/snapshot.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(tx)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Directory holding the database files and the `client_files` tree.
    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteJournalMode;
    use sqlx::{ConnectOptions, Connection};
    use std::time::Duration;

    fn files() -> impl Iterator<Item = &'static str> {
        std::iter::once(MAIN_FILE).chain(ATTACHED_FILES.iter().map(|(file, _)| *file))
    }

    /// Write to `path` from a separate connection that never waits for a lock.
    async fn write(path: &Path) -> sqlx::Result<()> {
        let mut conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .busy_timeout(Duration::ZERO)
            .connect()
            .await?;
        let result = sqlx::query("INSERT INTO marker DEFAULT VALUES").execute(&mut conn).await;
        conn.close().await?;
        result.map(drop)
    }

    #[tokio::test]
    async fn test_snapshot_locks_every_file() {
        let dir = tempfile::tempdir().unwrap();
        for file in files() {
            let mut conn = SqliteConnectOptions::new()
                .filename(dir.path().join(file))
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Delete)
                .connect()
                .await
                .unwrap();
            sqlx::query("CREATE TABLE marker (id INTEGER PRIMARY KEY)").execute(&mut conn).await.unwrap();
            conn.close().await.unwrap();
        }
        let db = Database::open(dir.path()).await.unwrap();

        let mut tx = db.snapshot().await.unwrap();
        for file in files() {
            assert!(write(&dir.path().join(file)).await.is_err(), "{file} was writable during a snapshot");
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM caches.marker").fetch_one(&mut *tx).await.unwrap();
        assert_eq!(count, 0);
        tx.commit().await.unwrap();

        for file in files() {
            write(&dir.path().join(file)).await.unwrap();
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM caches.marker").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count, 1);
    }
}
