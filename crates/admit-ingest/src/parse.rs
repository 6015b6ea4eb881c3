//! Row-level roster parsing.

use admit_core::{
  candidate::{CandidateId, NewCandidate, SubScores},
  store::RosterEntry,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::{
  Error, MAX_PRIORITY, ParsedRoster, Result, RowError, RowProblem,
  columns::{self, Columns, non_empty},
};

/// Lowercased fragments that mark a consent cell as "given".
const CONSENT_MARKERS: &[&str] = &["да", "yes", "true", "1", "подписано"];

pub fn parse(input: &str, date: NaiveDate) -> Result<ParsedRoster> {
  let mut reader = ReaderBuilder::new()
    .delimiter(sniff_delimiter(input))
    .trim(Trim::All)
    .flexible(true)
    .from_reader(input.as_bytes());

  let columns = Columns::resolve(reader.headers()?);
  if columns.id.is_empty() {
    return Err(Error::MissingIdColumn);
  }

  let mut roster = ParsedRoster::default();
  let mut rows = 0usize;

  for (index, result) in reader.records().enumerate() {
    // Header is line 1.
    let fallback_line = index as u64 + 2;
    let record = match result {
      Ok(record) => record,
      Err(e) => {
        let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
        roster.anomalies.push(RowError { line, problem: RowProblem::Unreadable(e.to_string()) });
        rows += 1;
        continue;
      }
    };
    if record.iter().all(|field| field.trim().is_empty()) {
      continue;
    }
    rows += 1;

    let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
    match parse_row(&record, &columns, date) {
      Ok(entry) => roster.entries.push(entry),
      Err(problem) => {
        warn!(line, %problem, "skipping roster row");
        roster.anomalies.push(RowError { line, problem });
      }
    }
  }

  if rows == 0 {
    return Err(Error::Empty);
  }
  Ok(roster)
}

fn parse_row(
  record: &StringRecord,
  columns: &Columns,
  date: NaiveDate,
) -> Result<RosterEntry, RowProblem> {
  let id = non_empty(record, &columns.id)
    .find_map(parse_integer)
    .filter(|n| *n > 0)
    .map(|n| n as CandidateId)
    .ok_or(RowProblem::MissingId)?;

  let consent = non_empty(record, &columns.consent)
    .next()
    .map(|value| {
      let value = value.to_lowercase();
      CONSENT_MARKERS.iter().any(|marker| value.contains(marker))
    })
    .unwrap_or(false);

  let priority = non_empty(record, &columns.priority)
    .filter_map(parse_integer)
    .find(|p| (1..=i64::from(MAX_PRIORITY)).contains(p))
    .map(|p| p as u32)
    .ok_or(RowProblem::MissingPriority)?;

  let scores = SubScores {
    physics_ict:  score(record, &columns.physics_ict, columns::PHYSICS_ICT[0])?,
    russian:      score(record, &columns.russian, columns::RUSSIAN[0])?,
    math:         score(record, &columns.math, columns::MATH[0])?,
    achievements: score(record, &columns.achievements, columns::ACHIEVEMENTS[0])?,
  };
  if scores.checked_total().is_none() {
    let sum = u64::from(scores.physics_ict)
      + u64::from(scores.russian)
      + u64::from(scores.math)
      + u64::from(scores.achievements);
    return Err(RowProblem::InvalidScore { column: "total", value: sum.to_string() });
  }

  Ok(RosterEntry {
    candidate: NewCandidate { id, scores, consent, submitted_on: date },
    priority,
  })
}

/// The first non-blank value among `columns`, or 0 if all are blank.
fn score(
  record: &StringRecord,
  columns: &[usize],
  column: &'static str,
) -> Result<u32, RowProblem> {
  match non_empty(record, columns).next() {
    None => Ok(0),
    Some(value) => parse_integer(value)
      .and_then(|n| u32::try_from(n).ok())
      .ok_or_else(|| RowProblem::InvalidScore { column, value: value.to_owned() }),
  }
}

/// Integers, also when a spreadsheet export wrote them as `85.0` or `85,0`.
fn parse_integer(value: &str) -> Option<i64> {
  let value = value.trim();
  if let Ok(n) = value.parse::<i64>() {
    return Some(n);
  }
  let decimal: f64 = value.replace(',', ".").parse().ok()?;
  (decimal.is_finite() && decimal.fract() == 0.0).then_some(decimal as i64)
}

/// Spreadsheets saved with a Russian locale use `;` between fields.
fn sniff_delimiter(input: &str) -> u8 {
  let header = input.lines().next().unwrap_or_default();
  if header.contains(';') && !header.contains(',') { b';' } else { b',' }
}
