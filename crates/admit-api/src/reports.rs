//! Handlers for per-date statistics, program overlaps and the full report.

use std::sync::Arc;

use admit_core::{
  overlap::{ProgramOverlap, program_overlaps},
  report::{AdmissionReport, history_window, rosters, trend},
  simulation::EmptyRunPolicy,
  store::{AdmissionStore, ProgramStatistics},
};
use axum::{
  Json,
  extract::{Query, State},
};

use crate::{
  error::ApiError,
  params::{DateParams, required_date},
};

/// `GET /statistics?date=<date>`
pub async fn statistics<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<ProgramStatistics>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;
  let stats = store
    .program_statistics(date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(stats))
}

/// `GET /overlaps?date=<date>`
pub async fn overlaps<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<ProgramOverlap>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;
  let preferences = store
    .preferences_on(date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(program_overlaps(preferences)))
}

/// `GET /report?date=<date>`
///
/// 404 unless the date has both preferences and consenting candidates.
/// Computes the date's results first if none are stored.
pub async fn report<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<AdmissionReport>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;

  let counts = store
    .date_counts(date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if counts.preferences == 0 {
    return Err(ApiError::NotFound(format!("no preferences submitted on {date}")));
  }
  if counts.consenting_candidates == 0 {
    return Err(ApiError::NotFound(format!("no consenting candidates on {date}")));
  }

  let current = store
    .materialize(date, EmptyRunPolicy::Reject)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let programs = store
    .list_programs()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let records = store
    .allocations(date, None)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let (from, to) = history_window(date);
  let history = store
    .passing_scores(from, to)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let statistics = store
    .program_statistics(date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(AdmissionReport {
    date,
    from_cache: current.from_cache,
    rosters: rosters(&programs, records),
    passing_scores: current.passing_scores,
    history: trend(&history),
    statistics,
  }))
}
