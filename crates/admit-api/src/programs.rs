//! Handlers for `/programs`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/programs` | Ordered by code |
//! | `POST` | `/programs` | Body: [`Program`]; 201 if new, 200 if replaced |

use std::sync::Arc;

use admit_core::{candidate::UpsertOutcome, program::Program, store::AdmissionStore};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /programs`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Program>>, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let programs = store
    .list_programs()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(programs))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
  pub program: Program,
  pub outcome: UpsertOutcome,
}

/// `POST /programs` — body: `{"code":"PM","name":"Applied Math","capacity":40}`
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Json(program): Json<Program>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AdmissionStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if program.code.trim().is_empty() {
    return Err(ApiError::BadRequest("program code must not be empty".into()));
  }

  let outcome = store
    .upsert_program(program.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let status = match outcome {
    UpsertOutcome::Inserted => StatusCode::CREATED,
    UpsertOutcome::Updated => StatusCode::OK,
  };
  Ok((status, Json(UpsertResponse { program, outcome })))
}
