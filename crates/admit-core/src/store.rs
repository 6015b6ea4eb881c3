//! The `AdmissionStore` trait and its query and read-model types.
//!
//! The trait is implemented by storage backends (e.g. `admit-store-sqlite`).
//! Higher layers (`admit-api`, `admit-server`) depend on this abstraction,
//! not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  allocation::AllocationRecord,
  candidate::{Candidate, CandidateId, NewCandidate, UpsertOutcome},
  passing_score::PassingScore,
  preference::Preference,
  program::Program,
  simulation::EmptyRunPolicy,
};

// ─── Write inputs ────────────────────────────────────────────────────────────

/// One row of an uploaded program roster: a candidate snapshot plus the
/// priority they gave the roster's program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
  pub candidate: NewCandidate,
  pub priority:  u32,
}

/// Counters reported back after a roster import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub inserted: usize,
  pub updated:  usize,
  /// Rows that were skipped, either while parsing or while writing.
  pub errors:   usize,
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AdmissionStore::list_roster`].
#[derive(Debug, Clone, Default)]
pub struct RosterQuery {
  pub program:      Option<String>,
  pub date:         Option<NaiveDate>,
  pub candidate_id: Option<CandidateId>,
  pub consent:      Option<bool>,
}

/// Parameters for [`AdmissionStore::search_candidates`].
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
  pub id:        Option<CandidateId>,
  /// Only candidates whose total is at least this.
  pub min_score: Option<u32>,
  pub date:      Option<NaiveDate>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A preference joined with the candidate snapshot of the same date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRow {
  #[serde(flatten)]
  pub preference: Preference,
  /// `None` if no snapshot exists for the preference's date.
  pub candidate:  Option<Candidate>,
}

/// A preference annotated with its program's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceDetail {
  #[serde(flatten)]
  pub preference:   Preference,
  pub program_name: Option<String>,
}

/// Latest snapshot of a candidate plus their preferences across all dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDetails {
  pub candidate:   Candidate,
  pub preferences: Vec<PreferenceDetail>,
}

/// A stored passing score with program metadata attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassingScoreRow {
  #[serde(flatten)]
  pub passing_score: PassingScore,
  /// Falls back to the program code if the program no longer exists.
  pub program_name:  String,
  pub capacity:      Option<u32>,
}

/// The result of [`AdmissionStore::materialize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Materialized {
  pub date:           NaiveDate,
  /// `true` if the rows were already stored and no simulation ran.
  pub from_cache:     bool,
  pub passing_scores: Vec<PassingScoreRow>,
}

/// Application and admission counts for one program on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramStatistics {
  pub program_code:             String,
  pub program_name:             String,
  pub capacity:                 u32,
  pub applications:             u64,
  pub applications_by_priority: BTreeMap<u32, u64>,
  pub enrolled_by_priority:     BTreeMap<u32, u64>,
}

/// How much input exists for a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateCounts {
  pub preferences:           u64,
  pub consenting_candidates: u64,
  pub allocations:           u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an admission store backend.
///
/// Candidate snapshots, preferences, allocations and passing scores are all
/// scoped by date. Computed results for a date are written at most once by
/// [`materialize`](Self::materialize) unless cleared first.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AdmissionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Programs ──────────────────────────────────────────────────────────

  fn upsert_program(
    &self,
    program: Program,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  fn list_programs(
    &self,
  ) -> impl Future<Output = Result<Vec<Program>, Self::Error>> + Send + '_;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Replace `program`'s preferences for `date` with `entries`, upserting
  /// each candidate snapshot. Runs as one transaction.
  ///
  /// Already computed results for `date` are left untouched.
  fn import_roster(
    &self,
    program: String,
    date: NaiveDate,
    entries: Vec<RosterEntry>,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + '_;

  // ── Simulation ────────────────────────────────────────────────────────

  /// Return the passing scores for `date`, computing them first if none are
  /// stored.
  ///
  /// A fresh computation clears the date's allocations, runs
  /// [`simulate`](crate::simulation::simulate) and writes allocations and
  /// passing scores, all in one transaction. Stored results are returned as
  /// they are, even if the inputs changed since.
  fn materialize(
    &self,
    date: NaiveDate,
    policy: EmptyRunPolicy,
  ) -> impl Future<Output = Result<Materialized, Self::Error>> + Send + '_;

  /// Delete allocations and passing scores for `date`, or for every date
  /// when `None`.
  fn clear_results(
    &self,
    date: Option<NaiveDate>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete all candidates, preferences and computed results. Programs stay.
  fn clear_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn list_roster(
    &self,
    query: RosterQuery,
  ) -> impl Future<Output = Result<Vec<RosterRow>, Self::Error>> + Send + '_;

  /// Candidate snapshots that have at least one preference.
  fn search_candidates(
    &self,
    query: CandidateQuery,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Returns `None` if the candidate has no snapshot with preferences.
  fn candidate_details(
    &self,
    id: CandidateId,
  ) -> impl Future<Output = Result<Option<CandidateDetails>, Self::Error>> + Send + '_;

  /// All preferences submitted on `date`.
  fn preferences_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Preference>, Self::Error>> + Send + '_;

  /// Allocation records for `date`, optionally restricted to one program,
  /// ordered by score descending, priority ascending, id ascending.
  fn allocations(
    &self,
    date: NaiveDate,
    program: Option<String>,
  ) -> impl Future<Output = Result<Vec<AllocationRecord>, Self::Error>> + Send + '_;

  /// Stored passing scores with `from <= date <= to`, ordered by date then
  /// program code.
  fn passing_scores(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<PassingScoreRow>, Self::Error>> + Send + '_;

  fn program_statistics(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ProgramStatistics>, Self::Error>> + Send + '_;

  fn date_counts(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<DateCounts, Self::Error>> + Send + '_;
}
