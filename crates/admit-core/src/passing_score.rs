//! Passing-score derivation from allocation results.
//!
//! The passing score of a program is the lowest total among the candidates
//! admitted to it. For a program that never filled this is just the lowest
//! admitted score rather than a real cutoff, which [`PassingStatus`] makes
//! explicit.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{allocation::AllocationRecord, program::Program};

/// Fill status of a program for one calculation date.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassingStatus {
  /// Every seat was taken.
  Computed,
  /// Some, but not all, seats were taken.
  Underfilled,
  /// Nobody was admitted.
  NoData,
}

/// The derived result for one program on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassingScore {
  pub program_code:  String,
  /// `None` exactly when `status` is [`PassingStatus::NoData`].
  pub score:         Option<u32>,
  pub status:        PassingStatus,
  pub calculated_on: NaiveDate,
}

/// Classify a program from its admission count and lowest admitted score.
pub fn classify(
  enrolled: usize,
  capacity: u32,
  min_score: Option<u32>,
) -> (Option<u32>, PassingStatus) {
  match min_score {
    None => (None, PassingStatus::NoData),
    Some(_) if enrolled == 0 => (None, PassingStatus::NoData),
    Some(score) if enrolled < capacity as usize => {
      (Some(score), PassingStatus::Underfilled)
    }
    Some(score) => (Some(score), PassingStatus::Computed),
  }
}

/// Derive one [`PassingScore`] per program from the run's allocation records.
///
/// Records for codes missing from `programs` are ignored.
pub fn derive(
  programs: &[Program],
  records: &[AllocationRecord],
  date: NaiveDate,
) -> Vec<PassingScore> {
  // code -> (enrolled, min score)
  let mut stats: BTreeMap<&str, (usize, u32)> = BTreeMap::new();
  for record in records.iter().filter(|r| r.simulation_date == date) {
    let entry = stats
      .entry(record.program_code.as_str())
      .or_insert((0, record.score));
    entry.0 += 1;
    entry.1 = entry.1.min(record.score);
  }

  programs
    .iter()
    .map(|program| {
      let (enrolled, min_score) = match stats.get(program.code.as_str()) {
        Some((count, min)) => (*count, Some(*min)),
        None => (0, None),
      };
      let (score, status) = classify(enrolled, program.capacity, min_score);
      PassingScore {
        program_code: program.code.clone(),
        score,
        status,
        calculated_on: date,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 8, 1).unwrap() }

  fn record(id: i64, code: &str, score: u32) -> AllocationRecord {
    AllocationRecord {
      candidate_id:    id,
      program_code:    code.into(),
      priority:        1,
      score,
      simulation_date: date(),
    }
  }

  fn program(code: &str, capacity: u32) -> Program {
    Program { code: code.into(), name: code.into(), capacity }
  }

  #[test]
  fn classification_table() {
    assert_eq!(classify(0, 5, None), (None, PassingStatus::NoData));
    assert_eq!(classify(2, 5, Some(70)), (Some(70), PassingStatus::Underfilled));
    assert_eq!(classify(5, 5, Some(70)), (Some(70), PassingStatus::Computed));
    assert_eq!(classify(0, 0, None), (None, PassingStatus::NoData));
  }

  #[test]
  fn filled_programs_report_their_minimum() {
    let scores = derive(
      &[program("A", 2), program("B", 1)],
      &[record(1, "A", 90), record(2, "A", 85), record(3, "B", 80)],
      date(),
    );
    assert_eq!(scores[0].score, Some(85));
    assert_eq!(scores[0].status, PassingStatus::Computed);
    assert_eq!(scores[1].score, Some(80));
    assert_eq!(scores[1].status, PassingStatus::Computed);
  }

  #[test]
  fn underfilled_and_empty_programs() {
    let scores = derive(&[program("A", 2), program("B", 1)], &[record(1, "A", 90)], date());
    assert_eq!(scores[0].score, Some(90));
    assert_eq!(scores[0].status, PassingStatus::Underfilled);
    assert_eq!(scores[1].score, None);
    assert_eq!(scores[1].status, PassingStatus::NoData);
  }

  #[test]
  fn status_text_round_trips_through_strum() {
    assert_eq!(PassingStatus::NoData.to_string(), "NO_DATA");
    assert_eq!(PassingStatus::from_str("UNDERFILLED").unwrap(), PassingStatus::Underfilled);
    assert!(PassingStatus::from_str("FULL").is_err());
  }
}
