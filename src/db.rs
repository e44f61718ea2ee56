use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use thiserror::Error;

use crate::models::{canonical_date, EventUpsert, PersistedEvent};
use crate::utils;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("tags column json error: {0}")]
    Tags(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS events(
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    o_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    time TEXT,
    date TEXT NOT NULL,
    people_needed INTEGER,
    location TEXT,
    image_url TEXT,
    tags TEXT,
    search_text TEXT,
    UNIQUE(name, o_id, date)
);
CREATE INDEX IF NOT EXISTS idx_events_o_id ON events(o_id);";

const UPSERT_SQL: &str = "INSERT INTO events (
        o_id, name, description, time, date, people_needed,
        location, image_url, tags, search_text
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(name, o_id, date) DO UPDATE SET
        description = excluded.description,
        time = excluded.time,
        people_needed = excluded.people_needed,
        location = excluded.location,
        image_url = excluded.image_url,
        tags = excluded.tags,
        search_text = excluded.search_text
    RETURNING event_id";

const SELECT_COLUMNS: &str = "event_id, o_id, name, date, description, time, people_needed,
    location, image_url, tags, search_text";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> StoreResult<Self> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(SCHEMA)
    }

    /// Starts a transaction; dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> StoreResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn find_by_key(
        &self,
        name: &str,
        o_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<PersistedEvent>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE name = ?1 AND o_id = ?2 AND date = ?3"
        );
        let row = self
            .conn
            .query_row(&sql, params![name, o_id, canonical_date(date)], raw_event_from_row)
            .optional()?;
        row.map(RawPersisted::into_event).transpose()
    }

    pub fn list_for_organization(&self, o_id: &str) -> StoreResult<Vec<PersistedEvent>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM events WHERE o_id = ?1 ORDER BY event_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![o_id], raw_event_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_event()?);
        }
        Ok(out)
    }

    pub fn count_for_organization(&self, o_id: &str) -> StoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE o_id = ?1",
            params![o_id],
            |row| row.get(0),
        )?)
    }

    pub fn count(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Inserts `event`, or updates the mutable columns of the row sharing its
/// natural key. Returns the row's `event_id`, which never changes on update.
pub fn upsert_event(tx: &Transaction<'_>, event: &EventUpsert) -> StoreResult<i64> {
    let tags = event
        .tags
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let id = tx.query_row(
        UPSERT_SQL,
        params![
            event.o_id,
            event.name,
            event.description,
            event.time,
            canonical_date(event.date),
            event.people_needed,
            event.location,
            event.image_url,
            tags,
            event.search_text,
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

struct RawPersisted {
    event: PersistedEvent,
    tags: Option<String>,
}

impl RawPersisted {
    fn into_event(self) -> StoreResult<PersistedEvent> {
        let mut event = self.event;
        event.tags = self
            .tags
            .map(|json| serde_json::from_str::<Vec<String>>(&json))
            .transpose()?;
        Ok(event)
    }
}

fn raw_event_from_row(row: &Row<'_>) -> rusqlite::Result<RawPersisted> {
    Ok(RawPersisted {
        event: PersistedEvent {
            event_id: row.get(0)?,
            o_id: row.get(1)?,
            name: row.get(2)?,
            date: row.get(3)?,
            description: row.get(4)?,
            time: row.get(5)?,
            people_needed: row.get(6)?,
            location: row.get(7)?,
            image_url: row.get(8)?,
            tags: None,
            search_text: row.get(10)?,
        },
        tags: row.get(9)?,
    })
}
