//! Which combinations of programs candidates apply to.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{candidate::CandidateId, preference::Preference};

/// Number of candidates whose set of applied-to programs is exactly
/// `programs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramOverlap {
  pub programs:   Vec<String>,
  pub candidates: usize,
}

/// Count candidates per exact program combination.
///
/// Output is ordered by combination size, then lexicographically, so single
/// programs come first.
pub fn program_overlaps(
  preferences: impl IntoIterator<Item = Preference>,
) -> Vec<ProgramOverlap> {
  let mut applied: BTreeMap<CandidateId, BTreeSet<String>> = BTreeMap::new();
  for p in preferences {
    applied.entry(p.candidate_id).or_default().insert(p.program_code);
  }

  let mut counts: BTreeMap<Vec<String>, usize> = BTreeMap::new();
  for programs in applied.into_values() {
    *counts.entry(programs.into_iter().collect()).or_default() += 1;
  }

  let mut overlaps: Vec<ProgramOverlap> = counts
    .into_iter()
    .map(|(programs, candidates)| ProgramOverlap { programs, candidates })
    .collect();
  overlaps.sort_by(|a, b| {
    a.programs
      .len()
      .cmp(&b.programs.len())
      .then_with(|| a.programs.cmp(&b.programs))
  });
  overlaps
}
