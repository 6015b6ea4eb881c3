//! Error types for `admit-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The program table is empty; there is nothing to allocate into.
  #[error("no programs are defined")]
  NoPrograms,

  /// No consenting candidates submitted on the simulation date.
  #[error("no consenting candidates for {0}")]
  NoCandidates(NaiveDate),

  #[error("invalid date: {0:?}")]
  InvalidDate(String),

  #[error("unknown passing-score status: {0:?}")]
  UnknownStatus(String),

  /// A [`SimulationSource`](crate::simulation::SimulationSource) query failed.
  #[error("source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for failures that stem from the input data rather than from the
  /// backing store (missing programs or candidates).
  pub fn is_data_error(&self) -> bool {
    matches!(self, Self::NoPrograms | Self::NoCandidates(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
