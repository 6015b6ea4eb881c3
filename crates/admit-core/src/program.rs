//! Programs and the per-run capacity table.
//!
//! A program's capacity is read once at the start of a simulation and then
//! decremented only in memory, inside a [`CapacityTable`] owned by that run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A capacity-limited program candidates can be admitted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
  pub code:     String,
  pub name:     String,
  /// Number of seats available for the whole run.
  pub capacity: u32,
}

// ─── Capacity table ──────────────────────────────────────────────────────────

/// Remaining seats per program code for a single simulation run.
///
/// Never shared between runs; build a fresh table from the program snapshot
/// every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityTable {
  seats: BTreeMap<String, u32>,
}

impl CapacityTable {
  /// Snapshot the capacities of `programs`.
  ///
  /// Fails with [`Error::NoPrograms`] when `programs` is empty.
  pub fn from_programs(programs: &[Program]) -> Result<Self> {
    if programs.is_empty() {
      return Err(Error::NoPrograms);
    }
    let seats = programs
      .iter()
      .map(|p| (p.code.clone(), p.capacity))
      .collect();
    Ok(Self { seats })
  }

  /// Seats left for `code`. Unknown codes have none.
  pub fn remaining(&self, code: &str) -> u32 {
    self.seats.get(code).copied().unwrap_or(0)
  }

  /// Consume one seat of `code`. Returns `false` if none was left.
  pub fn take_seat(&mut self, code: &str) -> bool {
    match self.seats.get_mut(code) {
      Some(left) if *left > 0 => {
        *left -= 1;
        true
      }
      _ => false,
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
    self.seats.iter().map(|(code, left)| (code.as_str(), *left))
  }

  pub fn into_inner(self) -> BTreeMap<String, u32> { self.seats }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn program(code: &str, capacity: u32) -> Program {
    Program { code: code.into(), name: format!("Program {code}"), capacity }
  }

  #[test]
  fn empty_program_list_is_a_configuration_error() {
    assert!(matches!(CapacityTable::from_programs(&[]), Err(Error::NoPrograms)));
  }

  #[test]
  fn take_seat_decrements_until_exhausted() {
    let mut table = CapacityTable::from_programs(&[program("A", 2)]).unwrap();
    assert!(table.take_seat("A"));
    assert_eq!(table.remaining("A"), 1);
    assert!(table.take_seat("A"));
    assert!(!table.take_seat("A"));
    assert_eq!(table.remaining("A"), 0);
  }

  #[test]
  fn unknown_program_has_no_seats() {
    let mut table = CapacityTable::from_programs(&[program("A", 1)]).unwrap();
    assert_eq!(table.remaining("Z"), 0);
    assert!(!table.take_seat("Z"));
  }
}
