//! Query-string helpers shared by the handlers.

use admit_core::date::parse_date;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

/// `?date=...` on its own.
#[derive(Debug, Deserialize, Default)]
pub struct DateParams {
  pub date: Option<String>,
}

/// Parse a date parameter that must be present.
pub fn required_date(value: Option<&str>, name: &str) -> Result<NaiveDate, ApiError> {
  let value = value
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("missing `{name}` parameter")))?;
  parse_date(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Parse a date parameter that may be absent or blank.
pub fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
  match value.filter(|v| !v.trim().is_empty()) {
    Some(v) => parse_date(v).map(Some).map_err(|e| ApiError::BadRequest(e.to_string())),
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_date_rejects_missing_and_malformed() {
    assert!(matches!(required_date(None, "date"), Err(ApiError::BadRequest(_))));
    assert!(matches!(required_date(Some(" "), "date"), Err(ApiError::BadRequest(_))));
    assert!(matches!(required_date(Some("2025/08/01"), "date"), Err(ApiError::BadRequest(_))));
    assert_eq!(
      required_date(Some("01.08.2025"), "date").unwrap(),
      NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    );
  }

  #[test]
  fn optional_date_treats_blank_as_absent() {
    assert_eq!(optional_date(Some("")).unwrap(), None);
    assert!(optional_date(Some("2025-08-01")).unwrap().is_some());
  }
}
