//! Builds a small Hydrus database on disk.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, SqliteConnection};
use std::path::Path;
use tempfile::TempDir;

pub const TAG_SERVICE: i64 = 5;
pub const FILE_SERVICE: i64 = 2;

pub const PNG: i64 = 2;
pub const JPEG: i64 = 1;
pub const PDF: i64 = 10;

pub struct Fixture {
    dir: TempDir,
    main: SqliteConnection,
    mappings: SqliteConnection,
    master: SqliteConnection,
    caches: SqliteConnection,
    namespaces: Vec<String>,
    subtags: i64,
}

async fn create(path: &Path, schema: &str) -> SqliteConnection {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await
        .unwrap();
    sqlx::query(schema).execute(&mut conn).await.unwrap();
    conn
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let main = create(
            &dir.path().join("client.db"),
            r#"
                CREATE TABLE services (
                    service_id INTEGER PRIMARY KEY,
                    service_key BLOB_BYTES UNIQUE,
                    service_type INTEGER,
                    name TEXT,
                    dictionary_string TEXT
                );
                CREATE TABLE current_files (
                    service_id INTEGER,
                    hash_id INTEGER,
                    timestamp INTEGER,
                    PRIMARY KEY (service_id, hash_id)
                );
                CREATE TABLE files_info (
                    hash_id INTEGER PRIMARY KEY,
                    size INTEGER,
                    mime INTEGER,
                    width INTEGER,
                    height INTEGER,
                    duration INTEGER,
                    num_frames INTEGER,
                    has_audio INTEGER_BOOLEAN,
                    num_words INTEGER
                );
                INSERT INTO services (service_id, service_key, service_type, name) VALUES
                    (1, CAST('local files' AS BLOB), 2, 'my files'),
                    (2, CAST('all local files' AS BLOB), 15, 'all local files'),
                    (5, CAST('local tags' AS BLOB), 5, 'my tags');
            "#,
        )
        .await;
        let mappings = create(
            &dir.path().join("client.mappings.db"),
            &format!(
                "CREATE TABLE current_mappings_{TAG_SERVICE} \
                 (tag_id INTEGER, hash_id INTEGER, PRIMARY KEY (tag_id, hash_id));"
            ),
        )
        .await;
        let master = create(
            &dir.path().join("client.master.db"),
            r#"
                CREATE TABLE hashes (hash_id INTEGER PRIMARY KEY, hash BLOB_BYTES UNIQUE);
                CREATE TABLE namespaces (namespace_id INTEGER PRIMARY KEY, namespace TEXT UNIQUE);
                CREATE TABLE subtags (subtag_id INTEGER PRIMARY KEY, subtag TEXT UNIQUE);
                CREATE TABLE tags (tag_id INTEGER PRIMARY KEY, namespace_id INTEGER, subtag_id INTEGER);
                INSERT INTO namespaces (namespace_id, namespace) VALUES (1, '');
            "#,
        )
        .await;
        let caches = create(
            &dir.path().join("client.caches.db"),
            "CREATE TABLE local_tags_cache (tag_id INTEGER PRIMARY KEY, tag TEXT UNIQUE);",
        )
        .await;
        Self { dir, main, mappings, master, caches, namespaces: vec![String::new()], subtags: 0 }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Hash bytes for a hash ID: 32 bytes of the ID.
    pub fn hash(hash_id: i64) -> String {
        hex_of(hash_id).repeat(32)
    }

    /// Add a tag, written as `namespace:subtag` or `subtag`.
    pub async fn tag(&mut self, tag_id: i64, text: &str) -> &mut Self {
        let (namespace, subtag) = text.split_once(':').unwrap_or(("", text));
        let namespace_id = match self.namespaces.iter().position(|ns| ns == namespace) {
            Some(index) => index as i64 + 1,
            None => {
                self.namespaces.push(namespace.to_string());
                let id = self.namespaces.len() as i64;
                sqlx::query("INSERT INTO namespaces (namespace_id, namespace) VALUES (?, ?)")
                    .bind(id)
                    .bind(namespace)
                    .execute(&mut self.master)
                    .await
                    .unwrap();
                id
            },
        };
        self.subtags += 1;
        sqlx::query("INSERT INTO subtags (subtag_id, subtag) VALUES (?, ?)")
            .bind(self.subtags)
            .bind(subtag)
            .execute(&mut self.master)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tags (tag_id, namespace_id, subtag_id) VALUES (?, ?, ?)")
            .bind(tag_id)
            .bind(namespace_id)
            .bind(self.subtags)
            .execute(&mut self.master)
            .await
            .unwrap();
        sqlx::query("INSERT INTO local_tags_cache (tag_id, tag) VALUES (?, ?)")
            .bind(tag_id)
            .bind(text)
            .execute(&mut self.caches)
            .await
            .unwrap();
        self
    }

    /// Add a file to "all local files" carrying the given tags.
    pub async fn file(&mut self, hash_id: i64, timestamp: i64, mime: i64, tag_ids: &[i64]) -> &mut Self {
        sqlx::query("INSERT INTO hashes (hash_id, hash) VALUES (?, ?)")
            .bind(hash_id)
            .bind(vec![hash_id as u8; 32])
            .execute(&mut self.master)
            .await
            .unwrap();
        sqlx::query("INSERT INTO current_files (service_id, hash_id, timestamp) VALUES (?, ?, ?)")
            .bind(FILE_SERVICE)
            .bind(hash_id)
            .bind(timestamp)
            .execute(&mut self.main)
            .await
            .unwrap();
        sqlx::query("INSERT INTO files_info (hash_id, size, mime, width, height) VALUES (?, ?, ?, 640, 480)")
            .bind(hash_id)
            .bind(hash_id * 100)
            .bind(mime)
            .execute(&mut self.main)
            .await
            .unwrap();
        for tag_id in tag_ids {
            sqlx::query(&format!("INSERT INTO current_mappings_{TAG_SERVICE} (tag_id, hash_id) VALUES (?, ?)"))
                .bind(tag_id)
                .bind(hash_id)
                .execute(&mut self.mappings)
                .await
                .unwrap();
        }
        self
    }

    /// Run a statement against `client.db`.
    pub async fn main(&mut self, sql: &str) -> &mut Self {
        sqlx::query(sql).execute(&mut self.main).await.unwrap();
        self
    }

    /// Run a statement against `client.master.db`.
    pub async fn master(&mut self, sql: &str) -> &mut Self {
        sqlx::query(sql).execute(&mut self.master).await.unwrap();
        self
    }

    /// Close every connection, leaving the files in place.
    pub async fn finish(self) -> TempDir {
        for conn in [self.main, self.mappings, self.master, self.caches] {
            sqlx::Connection::close(conn).await.unwrap();
        }
        self.dir
    }
}

fn hex_of(hash_id: i64) -> String {
    format!("{:02x}", hash_id as u8)
}
