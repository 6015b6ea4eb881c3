//! Error types for the admit-ingest roster codec.

use thiserror::Error;

/// A failure that rejects the whole upload. Problems with individual rows are
/// reported as [`RowError`](crate::RowError)s instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("no candidate id column found in header")]
  MissingIdColumn,

  #[error("roster has no data rows")]
  Empty,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
