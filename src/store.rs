use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::app_dirs::AppDirs;
use crate::session::Session;

/// Captured practice sessions, appended one row per completed session.
pub const SESSIONS_KEY: &str = "typingSessions";
/// Accumulated drill statistics blob.
pub const PRACTICE_STATS_KEY: &str = "typing_extension_stats";
/// Page visibility toggle state.
pub const VISIBILITY_KEY: &str = "visibilitySettings";
/// Email report configuration.
pub const EMAIL_SETTINGS_KEY: &str = "emailSettings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine a state directory")]
    NoStateDir,
}

/// Two value areas, mirroring device-local vs synced settings. Both live
/// in the same database here; the split keeps their keys from colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Local,
    Sync,
}

impl Area {
    fn as_str(&self) -> &'static str {
        match self {
            Area::Local => "local",
            Area::Sync => "sync",
        }
    }
}

/// SQLite-backed store with a key/value table for settings blobs and an
/// append-only table for captured sessions.
pub struct Store {
    conn: Connection,
    fallback_path: Option<PathBuf>,
}

impl Store {
    pub fn open_default() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().ok_or(StoreError::NoStateDir)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut store = Self::open(&db_path)?;
        store.fallback_path = AppDirs::fallback_log_path();
        Ok(store)
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_conn(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_conn(Connection::open_in_memory()?)
    }

    pub fn with_fallback_path(mut self, path: PathBuf) -> Self {
        self.fallback_path = Some(path);
        self
    }

    fn with_conn(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                area TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (area, key)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_completed_at
             ON sessions(completed_at)",
            [],
        )?;
        Ok(Self {
            conn,
            fallback_path: None,
        })
    }

    pub fn get_raw(&self, area: Area, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE area = ?1 AND key = ?2",
                params![area.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, area: Area, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (area, key, value) VALUES (?1, ?2, ?3)",
            params![area.as_str(), key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, area: Area, key: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM kv WHERE area = ?1 AND key = ?2",
            params![area.as_str(), key],
        )?;
        Ok(())
    }

    pub fn clear_area(&self, area: Area) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE area = ?1", params![area.as_str()])?;
        Ok(())
    }

    /// Read a typed value, falling back to `default` when the key is absent
    /// or the stored blob no longer matches the expected shape.
    pub fn get_or<T: DeserializeOwned>(&self, area: Area, key: &str, default: T) -> T {
        match self.get_raw(area, key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key, %err, "stored value does not deserialize; using default");
                    default
                }
            },
            Ok(None) => default,
            Err(err) => {
                warn!(key, %err, "could not read stored value; using default");
                default
            }
        }
    }

    pub fn set<T: Serialize>(&self, area: Area, key: &str, value: &T) -> Result<(), StoreError> {
        self.set_raw(area, key, &serde_json::to_string(value)?)
    }

    /// Append one completed session. Unlike a read-modify-write of a whole
    /// session list, a single INSERT cannot drop a concurrent writer's rows.
    pub fn append_session(&self, session: &Session) -> Result<(), StoreError> {
        let completed_at = session.end_time.unwrap_or(session.start_time).to_rfc3339();
        self.conn.execute(
            "INSERT INTO sessions (session_id, completed_at, body) VALUES (?1, ?2, ?3)",
            params![session.id, completed_at, serde_json::to_string(session)?],
        )?;
        Ok(())
    }

    /// Append a session, diverting to the fallback journal when the database
    /// write fails. Recording must not take the capture pipeline down.
    pub fn append_session_or_fallback(&self, session: &Session) {
        if let Err(err) = self.append_session(session) {
            warn!(session_id = %session.id, %err, "session insert failed; writing fallback journal");
            if let Err(err) = self.write_fallback(session) {
                error!(session_id = %session.id, %err, "fallback journal write failed; session lost");
            }
        }
    }

    /// All recorded sessions in insertion order. Rows whose body no longer
    /// parses are skipped rather than failing the whole read.
    pub fn sessions(&self) -> Result<Vec<Session>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM sessions ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut sessions = Vec::new();
        for row in rows {
            let body = row?;
            match serde_json::from_str(&body) {
                Ok(session) => sessions.push(session),
                Err(err) => warn!(%err, "skipping unreadable session row"),
            }
        }
        Ok(sessions)
    }

    pub fn clear_sessions(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }

    fn write_fallback(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.fallback_path.as_ref().ok_or(StoreError::NoStateDir)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", serde_json::to_string(session)?)?;
        Ok(())
    }
}
