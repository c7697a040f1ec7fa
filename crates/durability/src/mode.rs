//! Sync mode configuration
//!
//! Controls whether WAL appends fsync before returning.

/// Fsync policy for WAL appends
///
/// | Mode | fsync | Data loss window |
/// |------|-------|------------------|
/// | Always | Every record | Zero |
/// | OsBuffered | Never | Whatever the OS has not flushed |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Flush and fsync after every record
    ///
    /// A returned append guarantees the record is on stable storage.
    /// Expect milliseconds per write on spinning disks.
    Always,

    /// Hand each line to the OS and let it decide when to flush (the default)
    ///
    /// Writes are line buffered, so every record reaches the kernel as
    /// soon as it is appended, but a power failure can lose records the
    /// kernel had not yet written out.
    #[default]
    OsBuffered,
}

impl SyncMode {
    /// Whether appends must fsync before returning
    pub fn fsync_per_record(&self) -> bool {
        matches!(self, SyncMode::Always)
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            SyncMode::Always => "always fsync (safest, slowest)",
            SyncMode::OsBuffered => "OS buffered (fast, small loss window)",
        }
    }
}
