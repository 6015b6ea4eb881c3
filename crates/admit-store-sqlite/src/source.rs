//! [`SimulationSource`] over an open SQLite connection or transaction.

use admit_core::{
  candidate::{Candidate, CandidateId, SubScores},
  preference::Choice,
  program::Program,
  simulation::SimulationSource,
};
use chrono::NaiveDate;

use crate::encode::encode_date;

/// Reads simulation inputs through `conn`. Pass a transaction to make the
/// reads part of the same unit of work as the result writes.
pub struct SqlSource<'c> {
  conn: &'c rusqlite::Connection,
}

impl<'c> SqlSource<'c> {
  pub fn new(conn: &'c rusqlite::Connection) -> Self { Self { conn } }
}

/// Read every program, ordered by code.
pub fn load_programs(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<Program>> {
  let mut stmt = conn.prepare_cached("SELECT code, name, capacity FROM programs ORDER BY code")?;
  let programs = stmt
    .query_map([], |row| {
      Ok(Program {
        code:     row.get(0)?,
        name:     row.get(1)?,
        capacity: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(programs)
}

impl SimulationSource for SqlSource<'_> {
  type Error = rusqlite::Error;

  fn programs(&self) -> rusqlite::Result<Vec<Program>> { load_programs(self.conn) }

  fn consenting_candidates(&self, date: NaiveDate) -> rusqlite::Result<Vec<Candidate>> {
    let mut stmt = self.conn.prepare_cached(
      "SELECT candidate_id, physics_ict, russian, math, achievements, total
       FROM candidates
       WHERE submitted_on = ?1 AND consent = 1",
    )?;
    let candidates = stmt
      .query_map(rusqlite::params![encode_date(date)], |row| {
        Ok(Candidate {
          id:           row.get(0)?,
          scores:       SubScores {
            physics_ict:  row.get(1)?,
            russian:      row.get(2)?,
            math:         row.get(3)?,
            achievements: row.get(4)?,
          },
          total:        row.get(5)?,
          consent:      true,
          submitted_on: date,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(candidates)
  }

  fn preferences(
    &self,
    candidate_id: CandidateId,
    date: NaiveDate,
  ) -> rusqlite::Result<Vec<Choice>> {
    let mut stmt = self.conn.prepare_cached(
      "SELECT program_code, priority
       FROM preferences
       WHERE candidate_id = ?1 AND submitted_on = ?2
       ORDER BY priority ASC",
    )?;
    let choices = stmt
      .query_map(rusqlite::params![candidate_id, encode_date(date)], |row| {
        Ok(Choice { program_code: row.get(0)?, priority: row.get(1)? })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(choices)
  }
}
