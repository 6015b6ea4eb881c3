//! Handlers for roster uploads and the roster listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | `?program` and `?date` required; body is CSV text |
//! | `GET`  | `/lists` | Optional `program`, `date`, `candidate_id`, `consent` |

use std::sync::Arc;

use admit_core::{
  candidate::CandidateId,
  store::{AdmissionStore, ImportSummary, RosterQuery, RosterRow},
};
use axum::{
  Json,
  extract::{Query, State},
};
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  error::ApiError,
  params::{optional_date, required_date},
};

// ─── Upload ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  pub program: Option<String>,
  pub date:    Option<String>,
}

/// A row the parser skipped.
#[derive(Debug, Serialize)]
pub struct Anomaly {
  pub line:   u64,
  pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub program:   String,
  pub date:      NaiveDate,
  #[serde(flatten)]
  pub summary:   ImportSummary,
  pub anomalies: Vec<Anomaly>,
  pub message:   String,
}

/// `POST /upload?program=<code>&date=<date>` — body: the program's roster as
/// CSV.
///
/// Replaces the program's preferences for the date. Malformed rows are
/// skipped and reported in `anomalies`; they also count towards `errors`.
/// A roster without an id column or without data rows is rejected with 422.
pub async fn upload<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<UploadParams>,
  body: Bytes,
) -> Result<Json<UploadResponse>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = required_date(params.date.as_deref(), "date")?;
  let program = params
    .program
    .as_deref()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .ok_or_else(|| ApiError::BadRequest("missing `program` parameter".into()))?
    .to_owned();

  let known = store
    .list_programs()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .iter()
    .any(|p| p.code == program);
  if !known {
    return Err(ApiError::NotFound(format!("program {program} not found")));
  }

  let text = std::str::from_utf8(&body)
    .map_err(|e| ApiError::BadRequest(format!("roster is not valid UTF-8: {e}")))?;
  let parsed = admit_ingest::parse_roster(text, date)
    .map_err(|e| ApiError::Unprocessable(e.to_string()))?;

  let mut summary = store
    .import_roster(program.clone(), date, parsed.entries)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  summary.errors += parsed.anomalies.len();

  info!(%program, %date, skipped = parsed.anomalies.len(), "roster upload finished");

  Ok(Json(UploadResponse {
    message: format!(
      "import finished: {} inserted, {} updated, {} errors",
      summary.inserted, summary.updated, summary.errors
    ),
    anomalies: parsed
      .anomalies
      .into_iter()
      .map(|a| Anomaly { line: a.line, reason: a.problem.to_string() })
      .collect(),
    program,
    date,
    summary,
  }))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub program:      Option<String>,
  pub date:         Option<String>,
  pub candidate_id: Option<CandidateId>,
  pub consent:      Option<bool>,
}

/// `GET /lists[?program=...][&date=...][&candidate_id=...][&consent=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RosterRow>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = RosterQuery {
    program:      params.program.filter(|p| !p.trim().is_empty()),
    date:         optional_date(params.date.as_deref())?,
    candidate_id: params.candidate_id,
    consent:      params.consent,
  };

  let rows = store
    .list_roster(query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}
