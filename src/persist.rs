use crate::app_dirs::AppDirs;
use crate::config::StorageBackend;
use crate::error::QuizError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Key holding the serialized wrong-question book.
pub const WRONG_QUESTIONS_KEY: &str = "wrongQuestions";
/// Key holding the serialized practice record log.
pub const PRACTICE_RECORDS_KEY: &str = "practiceRecords";

/// Minimal key-value capability the ledger and record log persist through.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()>;
}

/// Reads a JSON array stored under `key`. Missing keys, read errors and
/// unparsable payloads all yield an empty collection.
pub fn load_json_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(Some(bytes)) => match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, "discarding unparsable stored data: {e}");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(key, "failed to read stored data: {e}");
            Vec::new()
        }
    }
}

/// Best-effort write of `items` under `key`. Failures are logged, never returned.
pub fn save_json_list<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, items: &[T]) {
    let bytes = match serde_json::to_vec(items) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key, "failed to serialize data: {e}");
            return;
        }
    };
    if let Err(e) = store.set(key, &bytes) {
        tracing::warn!(key, "failed to persist data: {e}");
    }
}

/// In-memory store. Clones share the same map, which lets tests simulate a
/// restart by building new components over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }
}

/// Key-value table in a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

fn to_io(e: rusqlite::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(to_io)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?1, ?2, CURRENT_TIMESTAMP)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
                "#,
                params![key, value],
            )
            .map(|_| ())
            .map_err(to_io)
    }
}

/// Opens the configured backend rooted at `data_dir`.
pub fn open_backend(
    backend: StorageBackend,
    data_dir: &Path,
) -> Result<Box<dyn KeyValueStore>, QuizError> {
    let store: Box<dyn KeyValueStore> = match backend {
        StorageBackend::Sqlite => Box::new(SqliteStore::open(AppDirs::db_path_in(data_dir))?),
        StorageBackend::Json => Box::new(FileStore::with_dir(AppDirs::json_dir_in(data_dir))),
    };
    tracing::debug!(%backend, dir = %data_dir.display(), "storage opened");
    Ok(store)
}
