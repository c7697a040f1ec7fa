//! Write-ahead log file operations
//!
//! The WAL is an append-only file of JSON-line records, written before
//! the corresponding in-memory mutation commits. Appends are serialised
//! by a mutex held across serialise+write+(optional fsync), so record
//! order on disk matches commit order.
//!
//! ## Handle registry
//!
//! Exactly one writer may exist per path. `Wal::open` consults a
//! process-wide registry and returns the existing handle when the path
//! is already open; `close` removes the path from the registry. The
//! file itself is never deleted.
//!
//! ## Recovery
//!
//! `replay` yields records from the start of the file. Lines that fail
//! to parse are skipped with a warning, and a partial trailing line
//! (one not terminated by `\n`) is discarded, so a crash mid-append
//! never poisons the records before it.

use crate::mode::SyncMode;
use crate::record::WalRecord;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use shoal_core::{Error, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One open handle per path, process-wide
static REGISTRY: Lazy<Mutex<HashMap<PathBuf, Arc<Wal>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Append-only durable journal of mutation records
///
/// # Example
///
/// ```ignore
/// let wal = Wal::open("wal.log", SyncMode::Always)?;
/// wal.append(&WalRecord::del("stale"))?;
/// for record in wal.replay()? {
///     // rebuild state
/// }
/// wal.close()?;
/// ```
pub struct Wal {
    path: PathBuf,
    mode: SyncMode,
    /// Line-buffered writer; `None` once the handle is closed
    writer: Mutex<Option<LineWriter<File>>>,
}

impl Wal {
    /// Open or create the WAL at `path` in append mode.
    ///
    /// Returns the existing handle if one is already open for this
    /// path; in that case the requested sync mode is ignored in favour
    /// of the mode the handle was first opened with.
    pub fn open(path: impl AsRef<Path>, mode: SyncMode) -> Result<Arc<Wal>> {
        let path = path.as_ref().to_path_buf();
        let mut registry = REGISTRY.lock();

        if let Some(existing) = registry.get(&path) {
            return Ok(Arc::clone(existing));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let wal = Arc::new(Wal {
            path: path.clone(),
            mode,
            writer: Mutex::new(Some(LineWriter::new(file))),
        });
        registry.insert(path.clone(), Arc::clone(&wal));
        info!(path = %path.display(), mode = mode.description(), "WAL opened");
        Ok(wal)
    }

    /// Path this WAL writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync mode this WAL was opened with
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Append one record as a JSON line.
    ///
    /// Under `SyncMode::Always` the record is flushed and fsynced
    /// before this returns. Any failure is reported as
    /// `FailedToPersist` and the caller must treat the mutation as not
    /// applied.
    pub fn append(&self, record: &WalRecord) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| {
            Error::FailedToPersist(io::Error::new(io::ErrorKind::Other, "WAL handle is closed"))
        })?;

        let mut line = serde_json::to_vec(record)
            .map_err(|e| Error::FailedToPersist(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        line.push(b'\n');

        writer.write_all(&line).map_err(Error::FailedToPersist)?;
        if self.mode.fsync_per_record() {
            writer.flush().map_err(Error::FailedToPersist)?;
            writer
                .get_ref()
                .sync_all()
                .map_err(Error::FailedToPersist)?;
        }
        Ok(())
    }

    /// Flush buffered lines to the OS. No-op once closed.
    pub fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Lazily yield parsed records from the start of the file.
    ///
    /// The sequence is finite and restartable as long as nothing is
    /// concurrently appending.
    pub fn replay(&self) -> Result<Replay> {
        self.flush()?;
        Replay::from_path(&self.path)
    }

    /// Current file size in bytes (0 if the file has gone missing)
    pub fn size(&self) -> Result<u64> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Flush, fsync, close the file handle and drop this path from the
    /// registry. Idempotent. Does not delete the file.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.writer.lock();
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            REGISTRY.lock().remove(&self.path);
            info!(path = %self.path.display(), "WAL closed");
        }
        Ok(())
    }
}

/// Iterator over the records of a WAL file
///
/// Corrupt lines are skipped with a warning; a trailing line with no
/// terminating `\n` (a crash mid-append) is discarded.
pub struct Replay {
    reader: Option<BufReader<File>>,
    buf: Vec<u8>,
}

impl Replay {
    fn from_path(path: &Path) -> Result<Replay> {
        let reader = match File::open(path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Replay {
            reader,
            buf: Vec::new(),
        })
    }
}

impl Iterator for Replay {
    type Item = WalRecord;

    fn next(&mut self) -> Option<WalRecord> {
        let reader = self.reader.as_mut()?;
        loop {
            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if !self.buf.ends_with(b"\n") {
                        // Partial trailing record from a crash mid-append
                        warn!("discarding partial trailing WAL record");
                        self.reader = None;
                        return None;
                    }
                    match serde_json::from_slice(&self.buf) {
                        Ok(record) => return Some(record),
                        Err(err) => warn!(%err, "skipping corrupt WAL entry"),
                    }
                }
                Err(err) => {
                    warn!(%err, "stopping WAL replay on read error");
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}
