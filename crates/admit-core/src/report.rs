//! Assembly of the per-date admission report.
//!
//! The report bundles the rosters, the current passing scores, a short trend
//! history and per-program statistics. Rendering it is left to consumers.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
  allocation::AllocationRecord,
  passing_score::PassingStatus,
  program::Program,
  store::{PassingScoreRow, ProgramStatistics},
};

/// How many days before the report date the trend history reaches back.
pub const HISTORY_DAYS: u64 = 3;

/// Most recent dates kept in the trend table.
pub const HISTORY_MAX_DATES: usize = 8;

/// Admitted candidates of one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRoster {
  pub program_code: String,
  pub program_name: String,
  pub capacity:     u32,
  pub admitted:     Vec<AllocationRecord>,
}

/// Passing scores of every program on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendRow {
  pub date:   NaiveDate,
  pub scores: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionReport {
  pub date:           NaiveDate,
  pub from_cache:     bool,
  pub rosters:        Vec<ProgramRoster>,
  pub passing_scores: Vec<PassingScoreRow>,
  /// Newest first.
  pub history:        Vec<TrendRow>,
  pub statistics:     Vec<ProgramStatistics>,
}

/// The inclusive date range the trend history is read from.
pub fn history_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  let from = date.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(date);
  (from, date)
}

/// Group stored passing scores into per-date rows.
///
/// Only rows with a real score (`COMPUTED` or `UNDERFILLED`, above zero) are
/// kept. At most [`HISTORY_MAX_DATES`] dates are returned, newest first.
pub fn trend(rows: &[PassingScoreRow]) -> Vec<TrendRow> {
  let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, u32>> = BTreeMap::new();
  for row in rows {
    let ps = &row.passing_score;
    let Some(score) = ps.score else { continue };
    if score == 0 || ps.status == PassingStatus::NoData {
      continue;
    }
    by_date
      .entry(ps.calculated_on)
      .or_default()
      .entry(ps.program_code.clone())
      .or_insert(score);
  }

  by_date
    .into_iter()
    .rev()
    .take(HISTORY_MAX_DATES)
    .map(|(date, scores)| TrendRow { date, scores })
    .collect()
}

/// Split a date's allocation records into per-program rosters.
///
/// Only programs with at least one admission get a roster. Records keep the
/// order they were given in.
pub fn rosters(programs: &[Program], records: Vec<AllocationRecord>) -> Vec<ProgramRoster> {
  let mut grouped: BTreeMap<String, Vec<AllocationRecord>> = BTreeMap::new();
  for record in records {
    grouped.entry(record.program_code.clone()).or_default().push(record);
  }

  grouped
    .into_iter()
    .map(|(code, admitted)| {
      let program = programs.iter().find(|p| p.code == code);
      ProgramRoster {
        program_name: program.map(|p| p.name.clone()).unwrap_or_else(|| code.clone()),
        capacity: program.map(|p| p.capacity).unwrap_or(0),
        program_code: code,
        admitted,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::passing_score::PassingScore;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 8, d).unwrap() }

  fn row(code: &str, d: u32, score: Option<u32>, status: PassingStatus) -> PassingScoreRow {
    PassingScoreRow {
      passing_score: PassingScore {
        program_code: code.into(),
        score,
        status,
        calculated_on: day(d),
      },
      program_name:  code.into(),
      capacity:      Some(10),
    }
  }

  #[test]
  fn window_reaches_back_three_days() {
    assert_eq!(history_window(day(4)), (day(1), day(4)));
  }

  #[test]
  fn trend_skips_rows_without_a_score_and_orders_newest_first() {
    let history = trend(&[
      row("PM", 1, Some(250), PassingStatus::Computed),
      row("IB", 1, None, PassingStatus::NoData),
      row("PM", 2, Some(240), PassingStatus::Underfilled),
      row("IB", 2, Some(0), PassingStatus::Computed),
    ]);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, day(2));
    assert_eq!(history[0].scores.get("PM"), Some(&240));
    assert!(history[0].scores.get("IB").is_none());
    assert_eq!(history[1].scores.len(), 1);
  }

  #[test]
  fn trend_keeps_the_most_recent_dates() {
    let rows: Vec<_> = (1..=12)
      .map(|d| row("PM", d, Some(200 + d), PassingStatus::Computed))
      .collect();
    let history = trend(&rows);
    assert_eq!(history.len(), HISTORY_MAX_DATES);
    assert_eq!(history[0].date, day(12));
    assert_eq!(history.last().unwrap().date, day(5));
  }

  #[test]
  fn rosters_group_by_program_and_fall_back_to_code() {
    let record = |id, code: &str| AllocationRecord {
      candidate_id:    id,
      program_code:    code.into(),
      priority:        1,
      score:           100,
      simulation_date: day(1),
    };
    let programs = [Program { code: "PM".into(), name: "Applied Math".into(), capacity: 5 }];
    let out = rosters(&programs, vec![record(1, "PM"), record(2, "XX"), record(3, "PM")]);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].program_name, "Applied Math");
    assert_eq!(out[0].admitted.len(), 2);
    assert_eq!(out[1].program_name, "XX");
    assert_eq!(out[1].capacity, 0);
  }
}
