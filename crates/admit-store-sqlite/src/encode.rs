//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` strings, statuses as their
//! `SCREAMING_SNAKE_CASE` names. Rows are first read into `Raw*` structs inside
//! the database thread and decoded afterwards.

use admit_core::{
  allocation::AllocationRecord,
  candidate::{Candidate, CandidateId, SubScores},
  passing_score::{PassingScore, PassingStatus},
  preference::Preference,
  store::{PassingScoreRow, PreferenceDetail, RosterRow},
};
use chrono::NaiveDate;

use crate::{Error, Result};

// ─── NaiveDate
// ────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── PassingStatus
// ────────────────────────────────────────────────────────────

pub fn encode_status(status: PassingStatus) -> String { status.to_string() }

pub fn decode_status(s: &str) -> Result<PassingStatus> {
  s.parse()
    .map_err(|_| Error::Core(admit_core::Error::UnknownStatus(s.to_owned())))
}

// ─── Raw row types
// ────────────────────────────────────────────────────────────

/// Column list matching [`RawCandidate::from_row`].
pub const CANDIDATE_COLUMNS: &str = "c.candidate_id, c.submitted_on, c.physics_ict, c.russian, \
                                     c.math, c.achievements, c.total, c.consent";

pub struct RawCandidate {
  pub candidate_id: CandidateId,
  pub submitted_on: String,
  pub physics_ict:  u32,
  pub russian:      u32,
  pub math:         u32,
  pub achievements: u32,
  pub total:        u32,
  pub consent:      bool,
}

impl RawCandidate {
  /// Read [`CANDIDATE_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      candidate_id: row.get(at)?,
      submitted_on: row.get(at + 1)?,
      physics_ict:  row.get(at + 2)?,
      russian:      row.get(at + 3)?,
      math:         row.get(at + 4)?,
      achievements: row.get(at + 5)?,
      total:        row.get(at + 6)?,
      consent:      row.get(at + 7)?,
    })
  }

  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      id:           self.candidate_id,
      scores:       SubScores {
        physics_ict:  self.physics_ict,
        russian:      self.russian,
        math:         self.math,
        achievements: self.achievements,
      },
      total:        self.total,
      consent:      self.consent,
      submitted_on: decode_date(&self.submitted_on)?,
    })
  }
}

pub struct RawPreference {
  pub candidate_id: CandidateId,
  pub program_code: String,
  pub priority:     u32,
  pub submitted_on: String,
}

impl RawPreference {
  /// Reads `candidate_id, program_code, priority, submitted_on`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      candidate_id: row.get(0)?,
      program_code: row.get(1)?,
      priority:     row.get(2)?,
      submitted_on: row.get(3)?,
    })
  }

  pub fn into_preference(self) -> Result<Preference> {
    Ok(Preference {
      candidate_id: self.candidate_id,
      program_code: self.program_code,
      priority:     self.priority,
      submitted_on: decode_date(&self.submitted_on)?,
    })
  }
}

/// A preference with the optional candidate snapshot of the same date
/// (LEFT JOIN, so every candidate column may be NULL).
pub struct RawRosterRow {
  pub preference:   RawPreference,
  pub physics_ict:  Option<u32>,
  pub russian:      Option<u32>,
  pub math:         Option<u32>,
  pub achievements: Option<u32>,
  pub total:        Option<u32>,
  pub consent:      Option<bool>,
}

impl RawRosterRow {
  pub fn into_row(self) -> Result<RosterRow> {
    let preference = self.preference.into_preference()?;
    let candidate = match (self.total, self.consent) {
      (Some(total), Some(consent)) => Some(Candidate {
        id: preference.candidate_id,
        scores: SubScores {
          physics_ict:  self.physics_ict.unwrap_or(0),
          russian:      self.russian.unwrap_or(0),
          math:         self.math.unwrap_or(0),
          achievements: self.achievements.unwrap_or(0),
        },
        total,
        consent,
        submitted_on: preference.submitted_on,
      }),
      _ => None,
    };
    Ok(RosterRow { preference, candidate })
  }
}

pub struct RawPreferenceDetail {
  pub preference:   RawPreference,
  pub program_name: Option<String>,
}

impl RawPreferenceDetail {
  pub fn into_detail(self) -> Result<PreferenceDetail> {
    Ok(PreferenceDetail {
      preference:   self.preference.into_preference()?,
      program_name: self.program_name,
    })
  }
}

pub struct RawAllocation {
  pub candidate_id:    CandidateId,
  pub simulation_date: String,
  pub program_code:    String,
  pub priority:        u32,
  pub score:           u32,
}

impl RawAllocation {
  pub fn into_record(self) -> Result<AllocationRecord> {
    Ok(AllocationRecord {
      candidate_id:    self.candidate_id,
      program_code:    self.program_code,
      priority:        self.priority,
      score:           self.score,
      simulation_date: decode_date(&self.simulation_date)?,
    })
  }
}

pub struct RawPassingScore {
  pub program_code:     String,
  pub calculation_date: String,
  pub passing_score:    Option<u32>,
  pub status:           String,
  pub program_name:     Option<String>,
  pub capacity:         Option<u32>,
}

impl RawPassingScore {
  pub fn into_row(self) -> Result<PassingScoreRow> {
    Ok(PassingScoreRow {
      program_name:  self.program_name.unwrap_or_else(|| self.program_code.clone()),
      capacity:      self.capacity,
      passing_score: PassingScore {
        score:         self.passing_score,
        status:        decode_status(&self.status)?,
        calculated_on: decode_date(&self.calculation_date)?,
        program_code:  self.program_code,
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_round_trip_and_rejection() {
    let date = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
    assert_eq!(encode_date(date), "2025-08-04");
    assert_eq!(decode_date("2025-08-04").unwrap(), date);
    assert!(matches!(decode_date("04.08.2025"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_status_is_a_core_error() {
    assert_eq!(decode_status(&encode_status(PassingStatus::Underfilled)).unwrap(), PassingStatus::Underfilled);
    assert!(matches!(
      decode_status("FULL"),
      Err(Error::Core(admit_core::Error::UnknownStatus(_)))
    ));
  }
}
