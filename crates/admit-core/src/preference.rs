//! Ranked program choices and the preference resolver.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateId;

/// One ranked choice of a candidate for one submission date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
  pub candidate_id: CandidateId,
  pub program_code: String,
  /// 1 is the most preferred program.
  pub priority:     u32,
  pub submitted_on: NaiveDate,
}

/// The part of a [`Preference`] the allocation engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
  pub program_code: String,
  pub priority:     u32,
}

impl From<Preference> for Choice {
  fn from(p: Preference) -> Self {
    Self { program_code: p.program_code, priority: p.priority }
  }
}

/// Order a candidate's choices in the sequence they are attempted.
///
/// Ascending priority; duplicate ranks (a data-quality defect) fall back to
/// the program code so the outcome stays deterministic.
pub fn resolve(choices: impl IntoIterator<Item = Choice>) -> Vec<Choice> {
  let mut choices: Vec<Choice> = choices.into_iter().collect();
  choices.sort_by(|a, b| {
    a.priority
      .cmp(&b.priority)
      .then_with(|| a.program_code.cmp(&b.program_code))
  });
  choices
}

/// Group date-scoped preferences into resolved choice lists per candidate.
pub fn resolve_all(
  preferences: impl IntoIterator<Item = Preference>,
  date: NaiveDate,
) -> BTreeMap<CandidateId, Vec<Choice>> {
  let mut grouped: BTreeMap<CandidateId, Vec<Choice>> = BTreeMap::new();
  for p in preferences.into_iter().filter(|p| p.submitted_on == date) {
    grouped.entry(p.candidate_id).or_default().push(p.into());
  }
  grouped
    .into_iter()
    .map(|(id, choices)| (id, resolve(choices)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn choice(code: &str, priority: u32) -> Choice {
    Choice { program_code: code.into(), priority }
  }

  #[test]
  fn orders_by_ascending_priority() {
    let resolved = resolve(vec![choice("B", 3), choice("A", 1), choice("C", 2)]);
    let codes: Vec<_> = resolved.iter().map(|c| c.program_code.as_str()).collect();
    assert_eq!(codes, ["A", "C", "B"]);
  }

  #[test]
  fn duplicate_ranks_break_ties_by_program_code() {
    let resolved = resolve(vec![choice("Z", 1), choice("M", 1)]);
    assert_eq!(resolved[0].program_code, "M");
    assert_eq!(resolved[1].program_code, "Z");
  }

  #[test]
  fn resolve_all_ignores_other_dates() {
    let today = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
    let yesterday = today.pred_opt().unwrap();
    let prefs = vec![
      Preference { candidate_id: 1, program_code: "A".into(), priority: 2, submitted_on: today },
      Preference { candidate_id: 1, program_code: "B".into(), priority: 1, submitted_on: today },
      Preference { candidate_id: 2, program_code: "A".into(), priority: 1, submitted_on: yesterday },
    ];
    let grouped = resolve_all(prefs, today);
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[&1][0].program_code, "B");
  }
}
