use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn, Span};

use crate::prober::AttemptRecord;
use crate::timestamp;

pub const DEFAULT_STORE_DIR: &str = ".db";
pub const DEFAULT_STORE_FILE: &str = "requests.db";

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS request_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT,
        timestamp TEXT,
        elapsed REAL,
        status_code INTEGER,
        successful_attempts INTEGER,
        retry_attempts_requested INTEGER,
        headers TEXT,
        cookies TEXT
    )";

const INSERT_RECORD: &str = "
    INSERT INTO request_log (
        url, timestamp, elapsed, status_code,
        successful_attempts, retry_attempts_requested, headers, cookies
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const AGGREGATE_BY_URL: &str = "
    SELECT COALESCE(SUM(successful_attempts), 0),
           COALESCE(SUM(retry_attempts_requested), 0)
    FROM request_log
    WHERE url = ?1";

const AGGREGATE_BY_URL_IN_RANGE: &str = "
    SELECT COALESCE(SUM(successful_attempts), 0),
           COALESCE(SUM(retry_attempts_requested), 0)
    FROM request_log
    WHERE url = ?1
      AND timestamp BETWEEN ?2 AND ?3";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store is not connected")]
    NotConnected,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid range bound: {0:#}")]
    InvalidBound(anyhow::Error),
}

/// Summed counters for one URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub successful: u64,
    pub requested: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyExists,
    Failed,
}

/// Where the store lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub file: String,
}

impl Default for StoreLocation {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
            file: DEFAULT_STORE_FILE.to_string(),
        }
    }
}

impl StoreLocation {
    pub fn new(dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file: file.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

/// Append-only log of probe cycles.
///
/// Every public operation is best effort: storage errors are logged and
/// turned into a no-op or an empty `Aggregate`, never returned.
pub struct AttemptStore {
    location: StoreLocation,
    conn: Option<Connection>,
    span: Span,
}

impl AttemptStore {
    pub fn new(location: StoreLocation, span: Span) -> Self {
        Self {
            location,
            conn: None,
            span,
        }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Create the store directory, file and table unless the file exists.
    /// An existing store is left untouched.
    pub fn initialize(&self) -> InitOutcome {
        let _enter = self.span.enter();
        let path = self.location.path();

        if path.exists() {
            warn!("Database: {} exists already.", self.location.file);
            return InitOutcome::AlreadyExists;
        }

        match create_store(&self.location.dir, &path) {
            Ok(()) => {
                info!("Database: {} has been successfully created.", self.location.file);
                InitOutcome::Created
            }
            Err(e) => {
                error!("Failed to create database {}: {}", path.display(), e);
                InitOutcome::Failed
            }
        }
    }

    /// Open the connection used by the read and write operations.
    /// A missing store is not created here; the store stays disconnected.
    pub fn connect(&mut self) {
        let _enter = self.span.enter();
        let path = self.location.path();

        match Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_WRITE) {
            Ok(conn) => {
                debug!("Connected to database {}", path.display());
                self.conn = Some(conn);
            }
            Err(e) => {
                error!("Could not open database {}: {}", path.display(), e);
                self.conn = None;
            }
        }
    }

    pub fn append(&self, record: &AttemptRecord) {
        let _enter = self.span.enter();
        match self.try_append(record) {
            Ok(()) => info!("A new entry has been added."),
            Err(e) => error!("An error occurred while adding an entry for {}: {}", record.url, e),
        }
    }

    pub fn aggregate(&self, url: &str) -> Aggregate {
        let _enter = self.span.enter();
        match self.try_aggregate(url) {
            Ok(agg) => {
                info!(
                    "The total of successful attempts for {} is: {} out of {}.",
                    url, agg.successful, agg.requested
                );
                agg
            }
            Err(e) => {
                error!("An error occurred while aggregating attempts for {}: {}", url, e);
                Aggregate::default()
            }
        }
    }

    /// Like [`aggregate`](Self::aggregate), restricted to rows whose timestamp
    /// lies in `[start, end]`. Bounds are ISO-8601 timestamps, rewritten into the
    /// canonical form before the comparison; an unparsable bound yields `(0, 0)`.
    pub fn aggregate_in_range(&self, url: &str, start: &str, end: &str) -> Aggregate {
        let _enter = self.span.enter();
        match self.try_aggregate_in_range(url, start, end) {
            Ok(agg) => {
                info!(
                    "The total of successful attempts for {} between {} and {} is: {} out of {}.",
                    url, start, end, agg.successful, agg.requested
                );
                agg
            }
            Err(e) => {
                error!(
                    "An error occurred while aggregating attempts for {} between {} and {}: {}",
                    url, start, end, e
                );
                Aggregate::default()
            }
        }
    }

    fn conn(&self) -> Result<&Connection, StorageError> {
        self.conn.as_ref().ok_or(StorageError::NotConnected)
    }

    pub(crate) fn try_append(&self, record: &AttemptRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let headers = serde_json::to_string(&record.headers)?;
        let cookies = serde_json::to_string(&record.cookies)?;

        debug!("Inserting entry for {}", record.url);
        conn.execute(
            INSERT_RECORD,
            params![
                record.url,
                timestamp::to_canonical(&record.timestamp),
                record.elapsed_seconds,
                record.status_code.map(i64::from),
                i64::from(record.successful_attempts),
                i64::from(record.retry_attempts_requested),
                headers,
                cookies,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn try_aggregate(&self, url: &str) -> Result<Aggregate, StorageError> {
        let conn = self.conn()?;
        let sums = conn.query_row(AGGREGATE_BY_URL, params![url], read_sums)?;
        Ok(sums)
    }

    pub(crate) fn try_aggregate_in_range(
        &self,
        url: &str,
        start: &str,
        end: &str,
    ) -> Result<Aggregate, StorageError> {
        let conn = self.conn()?;
        let start = timestamp::normalize_bound(start).map_err(StorageError::InvalidBound)?;
        let end = timestamp::normalize_bound(end).map_err(StorageError::InvalidBound)?;
        let sums = conn.query_row(AGGREGATE_BY_URL_IN_RANGE, params![url, start, end], read_sums)?;
        Ok(sums)
    }
}

fn create_store(dir: &Path, path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;
    let conn = Connection::open(path)?;
    conn.execute_batch(CREATE_TABLE)?;
    conn.close().map_err(|(_, e)| e)?;
    debug!("Closing database connection.");
    Ok(())
}

fn read_sums(row: &rusqlite::Row<'_>) -> rusqlite::Result<Aggregate> {
    let successful: i64 = row.get(0)?;
    let requested: i64 = row.get(1)?;
    Ok(Aggregate {
        successful: u64::try_from(successful).unwrap_or_default(),
        requested: u64::try_from(requested).unwrap_or_default(),
    })
}
