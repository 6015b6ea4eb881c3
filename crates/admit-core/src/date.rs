//! Parsing of user-supplied simulation dates.

use chrono::NaiveDate;

use crate::{Error, Result};

/// Parse a date written either as ISO `YYYY-MM-DD` or as `DD.MM.YYYY`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
  let trimmed = input.trim();
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d.%m.%Y"))
    .map_err(|_| Error::InvalidDate(input.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_iso_and_dotted_forms() {
    let expected = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    assert_eq!(parse_date("2025-08-01").unwrap(), expected);
    assert_eq!(parse_date("01.08.2025").unwrap(), expected);
    assert_eq!(parse_date(" 1.08.2025 ").unwrap(), expected);
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(parse_date("yesterday"), Err(Error::InvalidDate(_))));
    assert!(matches!(parse_date("2025-13-01"), Err(Error::InvalidDate(_))));
  }
}
