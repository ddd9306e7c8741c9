use super::models::*;
use crate::error::{Error, Result};
use rusqlite::{params, Connection, Row};
use tracing::debug;

/// Path stored for a datapoint between its insert and the creation of its directory.
pub const PENDING_PATH: &str = "";

fn dataset_from_row(row: &Row<'_>) -> rusqlite::Result<Dataset> {
    Ok(Dataset {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
    })
}

fn datapoint_from_row(row: &Row<'_>) -> rusqlite::Result<Datapoint> {
    Ok(Datapoint {
        id: row.get(0)?,
        path: row.get(1)?,
        dataset_id: row.get(2)?,
    })
}

/// Operations over the `datasets` and `datapoints` tables.
///
/// Implemented by [`super::Database`] (each statement commits on its own) and
/// by [`super::IndexTx`] (statements commit together).
pub trait IndexStore {
    fn connection(&self) -> &Connection;

    // ── Datasets ─────────────────────────────────────────────────

    fn find_dataset_by_path(&self, path: &str) -> Result<Option<Dataset>> {
        match self.connection().query_row(
            "SELECT id, name, path FROM datasets WHERE path = ?1",
            params![path],
            dataset_from_row,
        ) {
            Ok(ds) => Ok(Some(ds)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_dataset_by_id(&self, id: i64) -> Result<Option<Dataset>> {
        match self.connection().query_row(
            "SELECT id, name, path FROM datasets WHERE id = ?1",
            params![id],
            dataset_from_row,
        ) {
            Ok(ds) => Ok(Some(ds)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Names are not unique; the oldest row wins.
    fn find_dataset_by_name(&self, name: &str) -> Result<Option<Dataset>> {
        match self.connection().query_row(
            "SELECT id, name, path FROM datasets WHERE name = ?1 ORDER BY id LIMIT 1",
            params![name],
            dataset_from_row,
        ) {
            Ok(ds) => Ok(Some(ds)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_dataset(&self, name: &str, path: &str) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO datasets (name, path) VALUES (?1, ?2)",
            params![name, path],
        )?;
        let id = self.connection().last_insert_rowid();
        debug!("Inserted dataset {} ({}) at {}", id, name, path);
        Ok(id)
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let mut stmt = self
            .connection()
            .prepare_cached("SELECT id, name, path FROM datasets ORDER BY id")?;
        let rows = stmt
            .query_map([], dataset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Deleting a dataset also removes its datapoints (ON DELETE CASCADE).
    fn delete_dataset(&self, id: i64) -> Result<bool> {
        let removed = self
            .connection()
            .execute("DELETE FROM datasets WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    // ── Datapoints ───────────────────────────────────────────────

    fn find_datapoint_by_id(&self, id: i64) -> Result<Option<Datapoint>> {
        match self.connection().query_row(
            "SELECT id, path, dataset_id FROM datapoints WHERE id = ?1",
            params![id],
            datapoint_from_row,
        ) {
            Ok(dp) => Ok(Some(dp)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a datapoint with a caller-chosen id.
    /// Fails with [`Error::Constraint`] if `dataset_id` does not exist.
    fn insert_datapoint(&self, id: i64, path: &str, dataset_id: i64) -> Result<()> {
        self.connection().execute(
            "INSERT INTO datapoints (id, path, dataset_id) VALUES (?1, ?2, ?3)",
            params![id, path, dataset_id],
        )?;
        Ok(())
    }

    /// Insert a datapoint and let the store pick its id. The row carries
    /// [`PENDING_PATH`] until [`IndexStore::update_path`] is called.
    ///
    /// Fails with [`Error::IdsExhausted`] once a datapoint with id `i64::MAX`
    /// has ever been stored.
    fn insert_datapoint_auto_id(&self, dataset_id: i64) -> Result<i64> {
        match self.connection().execute(
            "INSERT INTO datapoints (path, dataset_id) VALUES (?1, ?2)",
            params![PENDING_PATH, dataset_id],
        ) {
            Ok(_) => Ok(self.connection().last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(code, msg))
                if code.code == rusqlite::ErrorCode::DiskFull =>
            {
                let highest: Option<i64> = self
                    .connection()
                    .query_row(
                        "SELECT seq FROM sqlite_sequence WHERE name = 'datapoints'",
                        [],
                        |row| row.get(0),
                    )
                    .ok();
                if highest == Some(i64::MAX) {
                    Err(Error::IdsExhausted)
                } else {
                    Err(rusqlite::Error::SqliteFailure(code, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a partial update. Returns `false` when there was nothing to change.
    fn update_datapoint(&self, id: i64, update: &DatapointUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let changed = self.connection().execute(
            "UPDATE datapoints SET path = COALESCE(?1, path), \
             dataset_id = COALESCE(?2, dataset_id) WHERE id = ?3",
            params![update.path, update.dataset_id, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("datapoint {}", id)));
        }
        Ok(true)
    }

    fn update_path(&self, id: i64, path: &str) -> Result<()> {
        self.update_datapoint(
            id,
            &DatapointUpdate {
                path: Some(path.to_string()),
                dataset_id: None,
            },
        )?;
        Ok(())
    }

    fn list_datapoints(&self) -> Result<Vec<Datapoint>> {
        let mut stmt = self
            .connection()
            .prepare_cached("SELECT id, path, dataset_id FROM datapoints ORDER BY id")?;
        let rows = stmt
            .query_map([], datapoint_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn count_datapoints_in_dataset(&self, dataset_id: i64) -> Result<i64> {
        let count = self.connection().query_row(
            "SELECT COUNT(*) FROM datapoints WHERE dataset_id = ?1",
            params![dataset_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn delete_datapoint(&self, id: i64) -> Result<bool> {
        let removed = self
            .connection()
            .execute("DELETE FROM datapoints WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
