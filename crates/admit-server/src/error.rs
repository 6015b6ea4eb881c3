//! Error type for the command-line operations in [`crate::commands`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {path}: {source}")]
  Read {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error("roster error: {0}")]
  Ingest(#[from] admit_ingest::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
