//! Handlers for `/candidates`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/candidates` | Optional `id`, `min_score`, `date` |
//! | `GET`  | `/candidates/{id}` | Latest snapshot plus all preferences; 404 if unknown |

use std::sync::Arc;

use admit_core::{
  candidate::{Candidate, CandidateId},
  store::{AdmissionStore, CandidateDetails, CandidateQuery},
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{error::ApiError, params::optional_date};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub id:        Option<CandidateId>,
  pub min_score: Option<u32>,
  pub date:      Option<String>,
}

/// `GET /candidates[?id=...][&min_score=...][&date=...]`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Candidate>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = CandidateQuery {
    id:        params.id,
    min_score: params.min_score,
    date:      optional_date(params.date.as_deref())?,
  };
  let candidates = store
    .search_candidates(query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(candidates))
}

/// `GET /candidates/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<CandidateId>,
) -> Result<Json<CandidateDetails>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let details = store
    .candidate_details(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("candidate {id} not found")))?;
  Ok(Json(details))
}
