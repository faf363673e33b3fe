use rusqlite::{params, Result, Row};
use tracing::debug;

use super::models::FileRecord;
use super::sqlite::Index;
use crate::hasher::Fingerprint;

fn record_from_row(row: &Row<'_>) -> Result<FileRecord> {
    let hash: Option<Vec<u8>> = row.get(5)?;
    Ok(FileRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        size: row.get::<_, i64>(2)? as u64,
        mtime: row.get(3)?,
        ctime: row.get(4)?,
        hash: hash.and_then(|bytes| bytes.try_into().ok()),
        scan_id: row.get(6)?,
    })
}

const RECORD_COLUMNS: &str = "id, path, size, modified, created, hash, scan_id";

impl Index {
    // ── Per-path operations ──────────────────────────────────────

    pub fn get_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM files WHERE path = ?1");
        match self
            .connection()
            .query_row(&sql, params![path], record_from_row)
        {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert or refresh a record for the current generation.
    ///
    /// On conflict the metadata and scan id are overwritten; the hash column
    /// only changes when a non-null hash is supplied, so a metadata-only
    /// refresh keeps a previously computed fingerprint.
    pub fn upsert(
        &self,
        path: &str,
        size: u64,
        mtime: i64,
        ctime: i64,
        hash: Option<&Fingerprint>,
    ) -> Result<()> {
        let run_id = self.run_id();
        self.with_busy_retry(|conn| {
            conn.execute(
                "INSERT INTO files (path, size, modified, created, hash, scan_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(path) DO UPDATE SET \
                     size = excluded.size, \
                     modified = excluded.modified, \
                     created = excluded.created, \
                     hash = COALESCE(excluded.hash, files.hash), \
                     scan_id = excluded.scan_id",
                params![
                    path,
                    size as i64,
                    mtime,
                    ctime,
                    hash.map(|h| h.as_slice()),
                    run_id
                ],
            )?;
            Ok(())
        })
    }

    /// Mark an unchanged record as observed by the current run.
    pub fn touch_scan(&self, path: &str) -> Result<()> {
        let run_id = self.run_id();
        self.with_busy_retry(|conn| {
            conn.execute(
                "UPDATE files SET scan_id = ?1 WHERE path = ?2",
                params![run_id, path],
            )?;
            Ok(())
        })
    }

    pub fn update_hash(&self, path: &str, hash: &Fingerprint) -> Result<()> {
        self.with_busy_retry(|conn| {
            conn.execute(
                "UPDATE files SET hash = ?1 WHERE path = ?2",
                params![hash.as_slice(), path],
            )?;
            Ok(())
        })
    }

    // ── Config ───────────────────────────────────────────────────

    pub fn config(&self, key: &str) -> Result<Option<String>> {
        match self.connection().query_row(
            "SELECT value FROM config WHERE key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.with_busy_retry(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    // ── Bucket queries (live records only) ───────────────────────

    /// Sizes shared by ≥2 live records, largest first.
    pub fn duplicate_sizes(&self, limit: usize, offset: usize) -> Result<Vec<u64>> {
        let mut stmt = self.connection().prepare_cached(
            "SELECT size FROM files WHERE scan_id = ?1 \
             GROUP BY size HAVING COUNT(*) >= 2 \
             ORDER BY size DESC LIMIT ?2 OFFSET ?3",
        )?;
        let sizes = stmt
            .query_map(
                params![self.run_id(), limit as i64, offset as i64],
                |row| Ok(row.get::<_, i64>(0)? as u64),
            )?
            .collect::<Result<Vec<_>>>()?;
        Ok(sizes)
    }

    pub fn files_of_size(&self, size: u64) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM files \
             WHERE size = ?1 AND scan_id = ?2 ORDER BY path ASC"
        );
        let mut stmt = self.connection().prepare_cached(&sql)?;
        let records = stmt
            .query_map(params![size as i64, self.run_id()], record_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Hashes shared by ≥2 live records, ordered by the largest member size
    /// descending. Ties break by member count then hash bytes so pagination
    /// stays deterministic.
    pub fn duplicate_hashes(&self, limit: usize, offset: usize) -> Result<Vec<Fingerprint>> {
        let mut stmt = self.connection().prepare_cached(
            "SELECT hash FROM files WHERE scan_id = ?1 AND hash IS NOT NULL \
             GROUP BY hash HAVING COUNT(*) >= 2 \
             ORDER BY MAX(size) DESC, COUNT(*) DESC, hash ASC \
             LIMIT ?2 OFFSET ?3",
        )?;
        let hashes = stmt
            .query_map(
                params![self.run_id(), limit as i64, offset as i64],
                |row| row.get::<_, Vec<u8>>(0),
            )?
            .collect::<Result<Vec<_>>>()?;
        Ok(hashes
            .into_iter()
            .filter_map(|bytes| bytes.try_into().ok())
            .collect())
    }

    pub fn files_of_hash(&self, hash: &Fingerprint) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM files \
             WHERE hash = ?1 AND scan_id = ?2 ORDER BY path ASC"
        );
        let mut stmt = self.connection().prepare_cached(&sql)?;
        let records = stmt
            .query_map(params![hash.as_slice(), self.run_id()], record_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    // ── Count-only variants ──────────────────────────────────────

    pub fn count_duplicate_sizes(&self) -> Result<u64> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM ( \
                 SELECT size FROM files WHERE scan_id = ?1 \
                 GROUP BY size HAVING COUNT(*) >= 2)",
            params![self.run_id()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_duplicate_hashes(&self) -> Result<u64> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM ( \
                 SELECT hash FROM files WHERE scan_id = ?1 AND hash IS NOT NULL \
                 GROUP BY hash HAVING COUNT(*) >= 2)",
            params![self.run_id()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Live files sitting in duplicate-size buckets: the candidate set for
    /// the content-hash phase.
    pub fn count_duplicate_size_files(&self) -> Result<u64> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM files WHERE scan_id = ?1 AND size IN ( \
                 SELECT size FROM files WHERE scan_id = ?1 \
                 GROUP BY size HAVING COUNT(*) >= 2)",
            params![self.run_id()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ── Generation sweep ─────────────────────────────────────────

    /// Delete records outside the `keep` newest distinct scan generations.
    pub fn sweep(&self, keep: u32) -> Result<usize> {
        let removed = self.with_busy_retry(|conn| {
            conn.execute(
                "DELETE FROM files WHERE scan_id NOT IN ( \
                     SELECT DISTINCT scan_id FROM files \
                     ORDER BY scan_id DESC LIMIT ?1)",
                params![keep as i64],
            )
        })?;
        if removed > 0 {
            debug!("sweep removed {removed} stale records");
        }
        Ok(removed)
    }
}
