//! Candidates and their score snapshots.
//!
//! A candidate is versioned by submission date: every upload produces a new
//! snapshot for that date rather than mutating history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type CandidateId = i64;

/// The four exam components that make up a candidate's total.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct SubScores {
  pub physics_ict:  u32,
  pub russian:      u32,
  pub math:         u32,
  pub achievements: u32,
}

impl SubScores {
  /// Sum of the four components, saturating at `u32::MAX`.
  pub fn total(&self) -> u32 { self.checked_total().unwrap_or(u32::MAX) }

  /// Sum of the four components, or `None` if it does not fit a `u32`.
  pub fn checked_total(&self) -> Option<u32> {
    self
      .physics_ict
      .checked_add(self.russian)?
      .checked_add(self.math)?
      .checked_add(self.achievements)
  }
}

/// A persisted candidate snapshot for one submission date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
  pub id:           CandidateId,
  #[serde(flatten)]
  pub scores:       SubScores,
  /// Always equal to `scores.total()`; never supplied by callers.
  pub total:        u32,
  pub consent:      bool,
  pub submitted_on: NaiveDate,
}

/// Input to [`crate::store::AdmissionStore::import_roster`].
/// The total is derived when the snapshot is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
  pub id:           CandidateId,
  pub scores:       SubScores,
  pub consent:      bool,
  pub submitted_on: NaiveDate,
}

impl From<NewCandidate> for Candidate {
  fn from(input: NewCandidate) -> Self {
    Self {
      id:           input.id,
      total:        input.scores.total(),
      scores:       input.scores,
      consent:      input.consent,
      submitted_on: input.submitted_on,
    }
  }
}

/// Whether a write created a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_is_recomputed_from_sub_scores() {
    let candidate = Candidate::from(NewCandidate {
      id:           7,
      scores:       SubScores { physics_ict: 80, russian: 70, math: 90, achievements: 5 },
      consent:      true,
      submitted_on: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
    });
    assert_eq!(candidate.total, 245);
  }

  #[test]
  fn oversized_components_do_not_overflow() {
    let scores = SubScores { math: u32::MAX, russian: 1, ..SubScores::default() };
    assert_eq!(scores.checked_total(), None);
    assert_eq!(scores.total(), u32::MAX);
  }
}
