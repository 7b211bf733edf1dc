use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::StoreError;

pub const DEFAULT_DB_PATH: &str = "data.sqlite";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One planning application as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationRecord {
    pub council_reference: String,
    pub address: String,
    pub description: String,
    pub info_url: String,
    pub comment_url: String,
    pub date_scraped: NaiveDate,
    pub date_received: Option<NaiveDate>,
    pub on_notice_from: Option<NaiveDate>,
    pub on_notice_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub inserted: bool,
}

/// Sole owner of the connection; passed explicitly to whoever writes.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Directory {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Safe to call on every start.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS data (
                council_reference TEXT PRIMARY KEY NOT NULL,
                address           TEXT,
                description       TEXT,
                info_url          TEXT,
                comment_url       TEXT,
                date_scraped      TEXT,
                date_received     TEXT,
                on_notice_from    TEXT,
                on_notice_to      TEXT
            );
            ",
        )?;
        Ok(())
    }

    /// Insert-if-absent. An existing row with the same reference is left untouched.
    pub fn upsert(&self, record: &ApplicationRecord) -> Result<Upserted, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO data
             (council_reference, address, description, info_url, comment_url,
              date_scraped, date_received, on_notice_from, on_notice_to)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(council_reference) DO NOTHING",
        )?;
        let changed = stmt.execute(rusqlite::params![
            record.council_reference,
            record.address,
            record.description,
            record.info_url,
            record.comment_url,
            record.date_scraped,
            record.date_received,
            record.on_notice_from,
            record.on_notice_to,
        ])?;
        Ok(Upserted { inserted: changed > 0 })
    }

    pub fn get(&self, reference: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_RECORD} WHERE council_reference = ?1"),
                [reference],
                record_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM data", [], |r| r.get(0))?)
    }

    pub fn date_counts(&self) -> Result<DateCounts, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(date_received), COUNT(on_notice_from), COUNT(on_notice_to) FROM data",
            [],
            |r| {
                Ok(DateCounts {
                    received: r.get(0)?,
                    notice_from: r.get(1)?,
                    notice_to: r.get(2)?,
                })
            },
        )?)
    }

    /// Most recently scraped first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ApplicationRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_RECORD} ORDER BY date_scraped DESC, council_reference LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

pub struct DateCounts {
    pub received: usize,
    pub notice_from: usize,
    pub notice_to: usize,
}

const SELECT_RECORD: &str = "SELECT council_reference, COALESCE(address,''), COALESCE(description,''),
        COALESCE(info_url,''), COALESCE(comment_url,''), date_scraped,
        date_received, on_notice_from, on_notice_to
 FROM data";

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRecord> {
    Ok(ApplicationRecord {
        council_reference: row.get(0)?,
        address: row.get(1)?,
        description: row.get(2)?,
        info_url: row.get(3)?,
        comment_url: row.get(4)?,
        date_scraped: row.get(5)?,
        date_received: row.get(6)?,
        on_notice_from: row.get(7)?,
        on_notice_to: row.get(8)?,
    })
}
