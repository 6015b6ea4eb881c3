//! The allocation engine: a single-pass, irrevocable greedy allocator.
//!
//! Candidates are processed strictly in [`rank`](crate::ranking::rank) order.
//! Each one takes a seat at the first program in their resolved preference
//! list that still has capacity. A candidate who finds no open program is
//! never reconsidered later in the run. This is not a stable matching and must
//! not be turned into one: global score order alone decides who gets first
//! refusal.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  candidate::CandidateId,
  preference::Choice,
  program::CapacityTable,
  ranking::RankedCandidate,
};

/// One admission produced by a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
  pub candidate_id:    CandidateId,
  pub program_code:    String,
  /// The rank of the preference the candidate was admitted on.
  pub priority:        u32,
  pub score:           u32,
  pub simulation_date: NaiveDate,
}

/// Everything the engine produces for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
  pub records:      Vec<AllocationRecord>,
  /// Seats left per program after the run.
  pub remaining:    CapacityTable,
  /// Ranked candidates who were not admitted anywhere, in processing order.
  pub not_enrolled: Vec<CandidateId>,
}

/// Run the greedy allocation over `ranking`.
///
/// `preferences_of` is the preference resolver: it must return a candidate's
/// choices for `date` in ascending priority order. Its errors abort the run.
pub fn allocate<F, E>(
  date: NaiveDate,
  mut capacity: CapacityTable,
  ranking: &[RankedCandidate],
  mut preferences_of: F,
) -> Result<AllocationOutcome, E>
where
  F: FnMut(CandidateId) -> Result<Vec<Choice>, E>,
{
  let mut admitted: BTreeSet<CandidateId> = BTreeSet::new();
  let mut records = Vec::new();
  let mut not_enrolled = Vec::new();

  for candidate in ranking {
    if admitted.contains(&candidate.id) {
      continue;
    }

    let choices = preferences_of(candidate.id)?;
    let placed = choices
      .into_iter()
      .find(|choice| capacity.take_seat(&choice.program_code));

    match placed {
      Some(choice) => {
        debug!(
          candidate = candidate.id,
          program = %choice.program_code,
          priority = choice.priority,
          score = candidate.total,
          "admitted"
        );
        admitted.insert(candidate.id);
        records.push(AllocationRecord {
          candidate_id:    candidate.id,
          program_code:    choice.program_code,
          priority:        choice.priority,
          score:           candidate.total,
          simulation_date: date,
        });
      }
      None => not_enrolled.push(candidate.id),
    }
  }

  Ok(AllocationOutcome { records, remaining: capacity, not_enrolled })
}

#[cfg(test)]
mod tests {
  use std::{collections::BTreeMap, convert::Infallible};

  use super::*;
  use crate::program::Program;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 8, 1).unwrap() }

  fn capacity(programs: &[(&str, u32)]) -> CapacityTable {
    let programs: Vec<Program> = programs
      .iter()
      .map(|(code, capacity)| Program {
        code:     (*code).into(),
        name:     (*code).into(),
        capacity: *capacity,
      })
      .collect();
    CapacityTable::from_programs(&programs).unwrap()
  }

  /// `(id, score, [program codes in priority order])`, already in rank order.
  fn run(
    table: CapacityTable,
    candidates: &[(CandidateId, u32, &[&str])],
  ) -> AllocationOutcome {
    let ranking: Vec<RankedCandidate> = candidates
      .iter()
      .map(|(id, total, _)| RankedCandidate { id: *id, total: *total })
      .collect();
    let prefs: BTreeMap<CandidateId, Vec<Choice>> = candidates
      .iter()
      .map(|(id, _, codes)| {
        let choices = codes
          .iter()
          .enumerate()
          .map(|(i, code)| Choice { program_code: (*code).into(), priority: i as u32 + 1 })
          .collect();
        (*id, choices)
      })
      .collect();
    allocate::<_, Infallible>(date(), table, &ranking, |id| {
      Ok(prefs.get(&id).cloned().unwrap_or_default())
    })
    .unwrap()
  }

  fn placements(outcome: &AllocationOutcome) -> Vec<(CandidateId, &str, u32)> {
    outcome
      .records
      .iter()
      .map(|r| (r.candidate_id, r.program_code.as_str(), r.priority))
      .collect()
  }

  #[test]
  fn reference_scenario() {
    let outcome = run(capacity(&[("A", 2), ("B", 1)]), &[
      (1, 90, &["A"]),
      (2, 85, &["A", "B"]),
      (3, 80, &["B"]),
      (4, 70, &["A"]),
    ]);
    assert_eq!(placements(&outcome), [(1, "A", 1), (2, "A", 1), (3, "B", 1)]);
    assert_eq!(outcome.not_enrolled, [4]);
    assert_eq!(outcome.remaining.remaining("A"), 0);
    assert_eq!(outcome.remaining.remaining("B"), 0);
  }

  #[test]
  fn falls_through_to_the_first_open_preference() {
    let outcome = run(capacity(&[("A", 1), ("B", 1), ("C", 1)]), &[
      (1, 90, &["A"]),
      (2, 80, &["A", "B", "C"]),
    ]);
    assert_eq!(placements(&outcome), [(1, "A", 1), (2, "B", 2)]);
  }

  #[test]
  fn candidates_are_not_reconsidered_once_rejected() {
    // 3 loses A to 1 and B to 2; C stays open but 3 never listed it.
    let outcome = run(capacity(&[("A", 1), ("B", 1), ("C", 5)]), &[
      (1, 90, &["A"]),
      (2, 85, &["B"]),
      (3, 80, &["A", "B"]),
      (4, 70, &["C"]),
    ]);
    assert_eq!(outcome.not_enrolled, [3]);
    assert_eq!(outcome.remaining.remaining("C"), 4);
  }

  #[test]
  fn candidate_without_preferences_is_not_enrolled() {
    let outcome = run(capacity(&[("A", 1)]), &[(1, 90, &[]), (2, 80, &["A"])]);
    assert_eq!(outcome.not_enrolled, [1]);
    assert_eq!(placements(&outcome), [(2, "A", 1)]);
  }

  #[test]
  fn unknown_and_zero_capacity_programs_are_skipped() {
    let outcome = run(capacity(&[("A", 0), ("B", 1)]), &[(1, 90, &["X", "A", "B"])]);
    assert_eq!(placements(&outcome), [(1, "B", 3)]);
  }

  #[test]
  fn duplicate_ranking_entries_are_admitted_once() {
    let outcome = run(capacity(&[("A", 3)]), &[(1, 90, &["A"]), (1, 90, &["A"])]);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.remaining.remaining("A"), 2);
  }

  #[test]
  fn resolver_errors_abort_the_run() {
    let table = capacity(&[("A", 1)]);
    let ranking = [RankedCandidate { id: 1, total: 10 }];
    let result = allocate(date(), table, &ranking, |_| Err::<Vec<Choice>, _>("boom"));
    assert_eq!(result.unwrap_err(), "boom");
  }
}
