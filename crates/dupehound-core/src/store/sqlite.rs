use rusqlite::{Connection, ErrorCode, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Writes that lose the busy race after the pragma timeout get a few more
/// attempts before the error is surfaced.
const BUSY_RETRIES: u32 = 3;
const BUSY_BACKOFF: Duration = Duration::from_millis(50);

/// Persistent file catalog plus the generation id of the current run.
///
/// A single connection; workers call [`Index::reopen`] for their own
/// short-lived connection sharing the same run id. WAL keeps readers
/// concurrent while SQLite serializes the writes.
pub struct Index {
    conn: Connection,
    path: PathBuf,
    run_id: i64,
}

impl Index {
    /// Open or create the index at `path` and start a new scan generation
    /// stamped with the current wall-clock second.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_at(path, chrono::Utc::now().timestamp())
    }

    /// Open with an explicit generation id. Runs starting within the same
    /// second share a generation; callers that need a distinct one (tests,
    /// diagnostics) pick their own.
    pub fn open_at(path: &Path, run_id: i64) -> Result<Self> {
        let conn = Connection::open(path)?;
        let index = Index {
            conn,
            path: path.to_path_buf(),
            run_id,
        };
        index.configure_pragmas()?;
        index.init_schema()?;
        Ok(index)
    }

    /// In-memory index for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Index {
            conn,
            path: PathBuf::from(":memory:"),
            run_id: chrono::Utc::now().timestamp(),
        };
        index.configure_pragmas()?;
        index.init_schema()?;
        Ok(index)
    }

    /// A second connection to the same index and scan generation.
    pub fn reopen(&self) -> Result<Self> {
        Self::open_at(&self.path, self.run_id)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("index schema initialized at {}", self.path.display());
        Ok(())
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `op`, retrying briefly when the database is busy or locked.
    pub(crate) fn with_busy_retry<T>(&self, mut op: impl FnMut(&Connection) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op(&self.conn) {
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if attempt < BUSY_RETRIES
                        && matches!(
                            e.code,
                            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                        ) =>
                {
                    attempt += 1;
                    debug!("index busy, retry {attempt}/{BUSY_RETRIES}");
                    std::thread::sleep(BUSY_BACKOFF);
                }
                other => return other,
            }
        }
    }
}
