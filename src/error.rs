//! Error types shared by the containers and the forecast front end.

use std::path::PathBuf;
use thiserror::Error;

/// Returned by `search`/`search_mut` when the queried key was never inserted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("key does not exist")]
pub struct KeyNotFound;

/// A violated construction precondition for a [`crate::ChainedHashMap`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("bucket count must be at least 1")]
    ZeroBuckets,
    #[error("max load factor must be positive and finite, got {0}")]
    InvalidLoadFactor(f64),
    #[error("growth factor must be greater than 1 and finite, got {0}")]
    InvalidGrowthFactor(f64),
    #[error("growing {bucket_count} buckets by {growth_factor} overflows the bucket count")]
    GrowthOverflow {
        bucket_count: usize,
        growth_factor: f64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: missing field `{field}`")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}
