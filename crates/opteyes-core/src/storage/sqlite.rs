use super::queries::IndexStore;
use crate::error::Result;
use rusqlite::{Connection, Transaction};
use tracing::debug;

const SCHEMA_VERSION: i64 = 1;

/// Handle to the index. The connection is closed when the handle is dropped.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        debug!("Opened index database at {}", path);
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, foreign keys on)");
        Ok(())
    }

    /// Check schema version and migrate if needed.
    /// Older versions are dropped and recreated: every row can be rebuilt from disk.
    fn migrate_schema(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            debug!(
                "Schema version {} < {}, dropping all tables and recreating",
                version, SCHEMA_VERSION
            );
            self.conn.execute_batch(
                "DROP TABLE IF EXISTS datapoints;
                 DROP TABLE IF EXISTS datasets;",
            )?;
        }

        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
        Ok(())
    }

    /// Start a transaction. Everything done through the returned handle is
    /// applied on [`IndexTx::commit`] and rolled back if it is dropped first.
    pub fn begin(&self) -> Result<IndexTx<'_>> {
        let tx = self.conn.unchecked_transaction()?;
        Ok(IndexTx { tx })
    }

    pub fn truncate_all(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM datapoints;
             DELETE FROM datasets;",
        )?;
        debug!("All tables truncated");
        Ok(())
    }
}

impl IndexStore for Database {
    fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// One atomic unit of index mutations.
pub struct IndexTx<'conn> {
    tx: Transaction<'conn>,
}

impl IndexTx<'_> {
    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        debug!("Index transaction committed");
        Ok(())
    }
}

impl IndexStore for IndexTx<'_> {
    fn connection(&self) -> &Connection {
        &self.tx
    }
}
