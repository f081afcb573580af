//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Key-value blobs (timer snapshot, background tracking record)
//! - Per-day flow statistics

use std::path::Path;
use std::rc::Rc;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, KeyValueStore};
use crate::clock::{Clock, SystemClock};
use crate::collaborators::{CollabResult, StatisticsSink};
use crate::error::StorageError;

/// Counters over some range of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub flows_started: u64,
    pub flows_completed: u64,
    pub breaks_started: u64,
    pub breaks_completed: u64,
    pub focus_min: u64,
    pub break_min: u64,
    pub days_active: u64,
}

/// SQLite database backing the key-value store and statistics.
///
/// "Today" for the statistics counters comes from the attached [`Clock`],
/// the system clock unless [`Database::with_clock`] says otherwise.
pub struct Database {
    conn: Connection,
    clock: Rc<dyn Clock>,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/flowroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("flowroom.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_conn(conn);
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self::from_conn(conn);
        db.migrate()?;
        Ok(db)
    }

    fn from_conn(conn: Connection) -> Self {
        Self {
            conn,
            clock: Rc::new(SystemClock),
        }
    }

    /// Date statistics with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_stats (
                date             TEXT PRIMARY KEY,
                flows_started    INTEGER NOT NULL DEFAULT 0,
                flows_completed  INTEGER NOT NULL DEFAULT 0,
                breaks_started   INTEGER NOT NULL DEFAULT 0,
                breaks_completed INTEGER NOT NULL DEFAULT 0,
                focus_min        INTEGER NOT NULL DEFAULT 0,
                break_min        INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    /// Add to one day's counters.
    ///
    /// Column names are fixed constants, never user input.
    fn bump(
        &self,
        date: NaiveDate,
        counter: &'static str,
        minutes: Option<(&'static str, u64)>,
    ) -> Result<(), StorageError> {
        let day = date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO daily_stats (date) VALUES (?1) ON CONFLICT(date) DO NOTHING",
            params![day],
        )?;
        match minutes {
            Some((col, amount)) => self.conn.execute(
                &format!(
                    "UPDATE daily_stats SET {counter} = {counter} + 1, {col} = {col} + ?2
                     WHERE date = ?1"
                ),
                params![day, amount],
            )?,
            None => self.conn.execute(
                &format!("UPDATE daily_stats SET {counter} = {counter} + 1 WHERE date = ?1"),
                params![day],
            )?,
        };
        Ok(())
    }

    pub fn record_flow_started(&self, date: NaiveDate) -> Result<(), StorageError> {
        self.bump(date, "flows_started", None)
    }

    pub fn record_flow_completed(&self, date: NaiveDate, minutes: u64) -> Result<(), StorageError> {
        self.bump(date, "flows_completed", Some(("focus_min", minutes)))
    }

    pub fn record_break_started(&self, date: NaiveDate) -> Result<(), StorageError> {
        self.bump(date, "breaks_started", None)
    }

    pub fn record_break_completed(&self, date: NaiveDate, minutes: u64) -> Result<(), StorageError> {
        self.bump(date, "breaks_completed", Some(("break_min", minutes)))
    }

    pub fn stats_for(&self, date: NaiveDate) -> Result<Stats, StorageError> {
        let day = date.format("%Y-%m-%d").to_string();
        let stats = self
            .conn
            .query_row(
                "SELECT flows_started, flows_completed, breaks_started, breaks_completed,
                        focus_min, break_min
                 FROM daily_stats WHERE date = ?1",
                params![day],
                |row| {
                    Ok(Stats {
                        flows_started: row.get(0)?,
                        flows_completed: row.get(1)?,
                        breaks_started: row.get(2)?,
                        breaks_completed: row.get(3)?,
                        focus_min: row.get(4)?,
                        break_min: row.get(5)?,
                        days_active: 1,
                    })
                },
            )
            .optional()?;
        Ok(stats.unwrap_or_default())
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        self.stats_for(self.clock.today())
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        let stats = self.conn.query_row(
            "SELECT COALESCE(SUM(flows_started), 0), COALESCE(SUM(flows_completed), 0),
                    COALESCE(SUM(breaks_started), 0), COALESCE(SUM(breaks_completed), 0),
                    COALESCE(SUM(focus_min), 0), COALESCE(SUM(break_min), 0),
                    COUNT(*)
             FROM daily_stats",
            [],
            |row| {
                Ok(Stats {
                    flows_started: row.get(0)?,
                    flows_completed: row.get(1)?,
                    breaks_started: row.get(2)?,
                    breaks_completed: row.get(3)?,
                    focus_min: row.get(4)?,
                    break_min: row.get(5)?,
                    days_active: row.get(6)?,
                })
            },
        )?;
        Ok(stats)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl StatisticsSink for Database {
    fn increment_flow_started(&self) -> CollabResult {
        Ok(self.record_flow_started(self.clock.today())?)
    }

    fn increment_flow_completed(&self, minutes: u64) -> CollabResult {
        Ok(self.record_flow_completed(self.clock.today(), minutes)?)
    }

    fn increment_break_started(&self) -> CollabResult {
        Ok(self.record_break_started(self.clock.today())?)
    }

    fn increment_break_completed(&self, minutes: u64) -> CollabResult {
        Ok(self.record_break_completed(self.clock.today(), minutes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        db.record_flow_started(day(1)).unwrap();
        db.record_flow_completed(day(1), 25).unwrap();
        db.record_break_started(day(1)).unwrap();
        db.record_break_completed(day(1), 5).unwrap();
        db.record_flow_completed(day(2), 40).unwrap();

        let first = db.stats_for(day(1)).unwrap();
        assert_eq!(first.flows_started, 1);
        assert_eq!(first.flows_completed, 1);
        assert_eq!(first.focus_min, 25);
        assert_eq!(first.break_min, 5);

        let all = db.stats_all().unwrap();
        assert_eq!(all.flows_completed, 2);
        assert_eq!(all.focus_min, 65);
        assert_eq!(all.days_active, 2);
    }

    #[test]
    fn empty_day_is_zeroed() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.stats_for(day(9)).unwrap(), Stats::default());
        assert_eq!(db.stats_all().unwrap().days_active, 0);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
        db.set("test", "again").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "again");
        db.delete("test").unwrap();
        assert!(db.get("test").unwrap().is_none());
    }

    #[test]
    fn statistics_sink_writes_today() {
        let db = Database::open_memory().unwrap();
        db.increment_flow_started().unwrap();
        db.increment_flow_completed(30).unwrap();
        let today = db.stats_today().unwrap();
        assert_eq!(today.flows_started, 1);
        assert_eq!(today.focus_min, 30);
    }

    #[test]
    fn statistics_follow_the_attached_clock() {
        let clock = Rc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 7, 5, 23, 59, 30).unwrap(),
        ));
        let db = Database::open_memory().unwrap().with_clock(clock.clone());
        db.increment_flow_completed(25).unwrap();
        assert_eq!(db.stats_for(day(5)).unwrap().flows_completed, 1);

        clock.advance_secs(60);
        db.increment_break_started().unwrap();
        assert_eq!(db.stats_for(day(6)).unwrap().breaks_started, 1);
        assert_eq!(db.stats_for(day(5)).unwrap().breaks_started, 0);
        assert_eq!(db.stats_today().unwrap().breaks_started, 1);
        assert_eq!(db.stats_all().unwrap().days_active, 2);
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowroom.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v"));
    }
}
