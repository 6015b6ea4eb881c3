//! Error type for `admit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] admit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A roster was uploaded for a program that is not configured.
  #[error("unknown program: {0}")]
  UnknownProgram(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
