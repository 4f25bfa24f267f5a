//! Error types, one enum per failure domain.
//!
//! Collector-side errors (`SamplingError`, `PersistenceError`) are always
//! recovered inside the collector loop. Query-side errors either fall back
//! (`RangeParseError`) or surface to the HTTP caller (`StoreError`).

use std::time::Duration;
use thiserror::Error;

/// Reading host counters failed; the cycle produces no sample.
#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("host counter read failed: {0}")]
    Read(String),

    #[error("root filesystem not found among {0} mounted disks")]
    RootDiskMissing(usize),

    #[error("host counter read timed out after {0:?}")]
    Timeout(Duration),

    #[error("host counter task aborted: {0}")]
    Task(String),
}

/// Writing a sample failed; the sample is discarded.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("insert failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insert timed out after {0:?}")]
    Timeout(Duration),

    #[error("{field} = {value} does not fit the store's signed 64-bit column")]
    OutOfRange { field: &'static str, value: u64 },
}

/// A window token with a recognised unit but an unusable count.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("window count {0:?} is not a base-10 integer")]
    Malformed(String),

    #[error("window count {0} is negative")]
    Negative(i64),

    #[error("window {0} is too large to subtract from the current time")]
    Overflow(String),
}

/// The store could not be reached or read on the query path.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("store round-trip timed out after {0:?}")]
    Timeout(Duration),

    #[error("row {row} has an invalid {field}: {reason}")]
    InvalidRow {
        row: usize,
        field: &'static str,
        reason: String,
    },
}

/// Configuration could not be turned into a usable `Config`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Startup failures reported from `main`.
#[derive(Error, Debug)]
pub enum HostwatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seeding failed: {0}")]
    Seed(#[from] PersistenceError),

    #[error("server exited: {0}")]
    Serve(std::io::Error),

    #[error("{0}")]
    Check(String),
}
