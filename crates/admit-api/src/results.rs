//! Handlers for computed results: passing scores and allocations.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/calculate` | `?date` required; computes once, then serves stored rows |
//! | `GET`  | `/allocations` | `?date` required, optional `program` |
//! | `GET`  | `/passing-scores` | `?from` required, `to` defaults to `from` |
//! | `POST` | `/clear-results` | Optional `?date`; all dates when absent |
//! | `POST` | `/clear` | Wipes candidates, preferences and results |

use std::{collections::BTreeMap, sync::Arc};

use admit_core::{
  allocation::AllocationRecord,
  passing_score::PassingStatus,
  report::{TrendRow, trend},
  simulation::EmptyRunPolicy,
  store::{AdmissionStore, PassingScoreRow},
};
use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  error::ApiError,
  params::{DateParams, optional_date, required_date},
};

// ─── Calculate ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
  pub date:                 NaiveDate,
  pub from_cache:           bool,
  pub total_programs:       usize,
  /// Program code to score, or to the status name when there is no full
  /// score to show.
  pub passing_scores:       BTreeMap<String, Value>,
  pub passing_scores_table: Vec<PassingScoreRow>,
  pub message:              String,
}

/// The compact `code -> score | status` map older clients read.
pub fn legacy_scores(rows: &[PassingScoreRow]) -> BTreeMap<String, Value> {
  rows
    .iter()
    .map(|row| {
      let ps = &row.passing_score;
      let value = match (ps.status, ps.score) {
        (PassingStatus::Computed, Some(score)) => Value::from(score),
        (status, _) => Value::from(status.to_string()),
      };
      (ps.program_code.clone(), value)
    })
    .collect()
}

/// `GET /calculate?date=<date>`
pub async fn calculate<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<CalculateResponse>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;

  let result = store
    .materialize(date, EmptyRunPolicy::Record)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(CalculateResponse {
    date,
    from_cache: result.from_cache,
    total_programs: result.passing_scores.len(),
    passing_scores: legacy_scores(&result.passing_scores),
    message: if result.from_cache {
      "served stored results".to_owned()
    } else {
      "simulation run and passing scores computed".to_owned()
    },
    passing_scores_table: result.passing_scores,
  }))
}

// ─── Allocations ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AllocationParams {
  pub date:    Option<String>,
  pub program: Option<String>,
}

/// `GET /allocations?date=<date>[&program=<code>]`
pub async fn allocations<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<AllocationParams>,
) -> Result<Json<Vec<AllocationRecord>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;
  let records = store
    .allocations(date, params.program.filter(|p| !p.trim().is_empty()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

// ─── Passing scores ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  pub from: Option<String>,
  pub to:   Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PassingScoresResponse {
  pub from:  NaiveDate,
  pub to:    NaiveDate,
  pub rows:  Vec<PassingScoreRow>,
  /// Per-date scores, newest first; see [`trend`].
  pub trend: Vec<TrendRow>,
}

/// `GET /passing-scores?from=<date>[&to=<date>]`
pub async fn passing_scores<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<PassingScoresResponse>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let from = required_date(params.from.as_deref(), "from")?;
  let to = optional_date(params.to.as_deref())?.unwrap_or(from);
  if from > to {
    return Err(ApiError::BadRequest(format!("`from` ({from}) is after `to` ({to})")));
  }

  let rows = store
    .passing_scores(from, to)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(PassingScoresResponse { from, to, trend: trend(&rows), rows }))
}

// ─── Maintenance ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ClearResponse {
  pub success: bool,
  pub message: String,
}

/// `POST /clear-results[?date=<date>]`
pub async fn clear_results<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<ClearResponse>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = optional_date(params.date.as_deref())?;
  store
    .clear_results(date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let message = match date {
    Some(date) => format!("results for {date} cleared"),
    None => "all results cleared".to_owned(),
  };
  Ok(Json(ClearResponse { success: true, message }))
}

/// `POST /clear`
pub async fn clear_all<S>(State(store): State<Arc<S>>) -> Result<Json<ClearResponse>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .clear_all()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(ClearResponse { success: true, message: "all candidate data cleared".to_owned() }))
}

#[cfg(test)]
mod tests {
  use admit_core::passing_score::PassingScore;

  use super::*;

  fn row(code: &str, score: Option<u32>, status: PassingStatus) -> PassingScoreRow {
    PassingScoreRow {
      passing_score: PassingScore {
        program_code: code.into(),
        score,
        status,
        calculated_on: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
      },
      program_name:  code.into(),
      capacity:      Some(1),
    }
  }

  #[test]
  fn legacy_map_shows_status_unless_computed() {
    let map = legacy_scores(&[
      row("A", Some(85), PassingStatus::Computed),
      row("B", Some(90), PassingStatus::Underfilled),
      row("C", None, PassingStatus::NoData),
    ]);
    assert_eq!(map["A"], Value::from(85));
    assert_eq!(map["B"], Value::from("UNDERFILLED"));
    assert_eq!(map["C"], Value::from("NO_DATA"));
  }
}
