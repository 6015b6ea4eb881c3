//! Global processing order of candidates for a simulation date.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result,
  candidate::{Candidate, CandidateId},
};

/// A candidate as seen by the allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
  pub id:    CandidateId,
  pub total: u32,
}

/// Rank the consenting candidates who submitted on `date`.
///
/// Order is total score descending, then id ascending. The id tie-break is
/// what makes repeated runs reproducible. Fails with
/// [`Error::NoCandidates`] when nobody qualifies.
pub fn rank(
  candidates: impl IntoIterator<Item = Candidate>,
  date: NaiveDate,
) -> Result<Vec<RankedCandidate>> {
  let mut ranked: Vec<RankedCandidate> = candidates
    .into_iter()
    .filter(|c| c.consent && c.submitted_on == date)
    .map(|c| RankedCandidate { id: c.id, total: c.total })
    .collect();

  if ranked.is_empty() {
    return Err(Error::NoCandidates(date));
  }

  ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.id.cmp(&b.id)));
  Ok(ranked)
}
