//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request was well-formed but the stored data cannot satisfy it.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// The status a store error maps to: 422 when a core data error (no
  /// programs, no candidates) sits anywhere in its source chain, 500
  /// otherwise.
  fn store_status(e: &(dyn std::error::Error + 'static)) -> StatusCode {
    let mut current = Some(e);
    while let Some(err) = current {
      if let Some(core) = err.downcast_ref::<admit_core::Error>()
        && core.is_data_error()
      {
        return StatusCode::UNPROCESSABLE_ENTITY;
      }
      current = err.source();
    }
    StatusCode::INTERNAL_SERVER_ERROR
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => (ApiError::store_status(e.as_ref()), e.to_string()),
    };
    if status.is_server_error() {
      tracing::error!(error = %message, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("wrapped: {0}")]
  struct Wrapper(#[source] admit_core::Error);

  #[test]
  fn data_errors_in_the_source_chain_are_unprocessable() {
    let err = ApiError::Store(Box::new(Wrapper(admit_core::Error::NoPrograms)));
    assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

    let err = ApiError::Store(Box::new(admit_core::Error::UnknownStatus("FULL".into())));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn client_errors_keep_their_status() {
    assert_eq!(
      ApiError::NotFound("x".into()).into_response().status(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      ApiError::BadRequest("x".into()).into_response().status(),
      StatusCode::BAD_REQUEST
    );
  }
}
