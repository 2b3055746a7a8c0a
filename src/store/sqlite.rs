use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TelefeedError};
use crate::domain::normalize_handle;
use crate::store::ChannelRepository;

const SEEDED_KEY: &str = "channels_seeded";

pub struct SqliteChannelStore {
    conn: Mutex<Connection>,
}

impl SqliteChannelStore {
    /// Open (or create) the store at `path`.
    ///
    /// `defaults` are inserted the first time a database is created. Once
    /// seeded, an emptied list stays empty.
    pub fn new<P: AsRef<Path>>(path: P, defaults: &[String]) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, defaults)
    }

    pub fn in_memory(defaults: &[String]) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, defaults)
    }

    fn with_connection(conn: Connection, defaults: &[String]) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        store.seed_defaults(defaults)?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TelefeedError::Other(format!("Channel store lock poisoned: {}", e)))
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| TelefeedError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn seed_defaults(&self, defaults: &[String]) -> Result<()> {
        let seeded = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SEEDED_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .is_some()
        };

        if seeded {
            return Ok(());
        }

        for handle in defaults {
            if let Err(e) = self.add(handle) {
                tracing::warn!("Skipping default channel {:?}: {}", handle, e);
            }
        }

        self.conn()?.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            params![SEEDED_KEY, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

impl ChannelRepository for SqliteChannelStore {
    fn list(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT handle FROM channels ORDER BY position, id")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(handles)
    }

    fn add(&self, handle: &str) -> Result<bool> {
        let handle =
            normalize_handle(handle).ok_or_else(|| TelefeedError::InvalidChannel(handle.into()))?;

        let conn = self.conn()?;
        let position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM channels",
            [],
            |row| row.get(0),
        )?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO channels (handle, position, created_at) VALUES (?1, ?2, ?3)",
            params![handle, position, Utc::now().to_rfc3339()],
        )?;

        Ok(inserted == 1)
    }

    fn remove(&self, handle: &str) -> Result<bool> {
        let handle =
            normalize_handle(handle).ok_or_else(|| TelefeedError::InvalidChannel(handle.into()))?;

        let removed = self
            .conn()?
            .execute("DELETE FROM channels WHERE handle = ?1", params![handle])?;

        Ok(removed > 0)
    }

    fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM channels", [])?;
        Ok(())
    }
}
