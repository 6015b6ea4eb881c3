//! CSV roster codec for the admission simulator.
//!
//! Turns an uploaded program roster (one row per candidate who listed the
//! program) into [`RosterEntry`] values. Header names vary between exports,
//! so every field is looked up through a list of aliases. Pure synchronous;
//! no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use admit_ingest::parse_roster;
//! use chrono::NaiveDate;
//!
//! let csv = "ID,Consent,Priority,Math,Russian,Physics/ICT,Achievements\n17,yes,1,90,80,85,5\n";
//! let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
//! let roster = parse_roster(csv, date).unwrap();
//! println!("{} entries, {} skipped", roster.entries.len(), roster.anomalies.len());
//! ```

mod columns;
pub mod error;
mod parse;

use std::fmt;

pub use error::{Error, Result};
use admit_core::store::RosterEntry;
use chrono::NaiveDate;

/// Highest priority rank a roster row may carry.
pub const MAX_PRIORITY: u32 = 4;

// ─── Public types
// ─────────────────────────────────────────────────────────────

/// The outcome of parsing one roster.
#[derive(Debug, Default)]
pub struct ParsedRoster {
  pub entries:   Vec<RosterEntry>,
  /// Rows that were skipped, in input order.
  pub anomalies: Vec<RowError>,
}

/// Why a single row was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowProblem {
  MissingId,
  MissingPriority,
  InvalidScore { column: &'static str, value: String },
  Unreadable(String),
}

impl fmt::Display for RowProblem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingId => f.write_str("no candidate id"),
      Self::MissingPriority => write!(f, "no priority between 1 and {MAX_PRIORITY}"),
      Self::InvalidScore { column, value } => write!(f, "invalid {column} score {value:?}"),
      Self::Unreadable(msg) => write!(f, "unreadable row: {msg}"),
    }
  }
}

/// A skipped row with its 1-based line number in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
  pub line:    u64,
  pub problem: RowProblem,
}

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Parse a roster whose rows were all submitted on `date`.
///
/// Malformed rows never abort the parse; they are collected in
/// [`ParsedRoster::anomalies`]. The whole input is rejected only if it has no
/// id column or no data rows at all.
pub fn parse_roster(input: &str, date: NaiveDate) -> Result<ParsedRoster> {
  parse::parse(input, date)
}
