//! Clock port interface

/// Port for wall-clock time used in output naming
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn unix_timestamp(&self) -> i64;
}
