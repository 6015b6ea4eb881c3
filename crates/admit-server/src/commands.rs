//! Store operations behind the CLI subcommands and server startup.

use std::path::Path;

use admit_core::{
  program::Program,
  simulation::EmptyRunPolicy,
  store::{AdmissionStore, ImportSummary, Materialized},
};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
  ProgramConfig,
  error::{Error, Result},
};

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

/// Upsert every configured program. Programs already in the store but absent
/// from the configuration are left alone.
pub async fn sync_programs<S: AdmissionStore>(
  store: &S,
  programs: &[ProgramConfig],
) -> Result<()> {
  for p in programs {
    let outcome = store
      .upsert_program(Program {
        code:     p.code.clone(),
        name:     p.name.clone().unwrap_or_else(|| p.code.clone()),
        capacity: p.capacity,
      })
      .await
      .map_err(store_error)?;
    info!(code = %p.code, capacity = p.capacity, ?outcome, "program configured");
  }
  Ok(())
}

/// Parse the CSV roster at `path` and import it for `program` on `date`.
pub async fn import_file<S: AdmissionStore>(
  store: &S,
  program: &str,
  date: NaiveDate,
  path: &Path,
) -> Result<ImportSummary> {
  let text = tokio::fs::read_to_string(path).await.map_err(|source| Error::Read {
    path: path.display().to_string(),
    source,
  })?;

  let parsed = admit_ingest::parse_roster(&text, date)?;
  for anomaly in &parsed.anomalies {
    warn!(line = anomaly.line, problem = %anomaly.problem, "skipped roster row");
  }

  let mut summary = store
    .import_roster(program.to_owned(), date, parsed.entries)
    .await
    .map_err(store_error)?;
  summary.errors += parsed.anomalies.len();
  Ok(summary)
}

/// Compute the passing scores for `date`, or fetch them if already stored.
pub async fn calculate<S: AdmissionStore>(store: &S, date: NaiveDate) -> Result<Materialized> {
  store
    .materialize(date, EmptyRunPolicy::Record)
    .await
    .map_err(store_error)
}

pub async fn clear<S: AdmissionStore>(store: &S, date: Option<NaiveDate>) -> Result<()> {
  store.clear_results(date).await.map_err(store_error)
}

#[cfg(test)]
mod tests {
  use admit_store_sqlite::SqliteStore;

  use super::*;

  fn program(code: &str, capacity: u32) -> ProgramConfig {
    ProgramConfig { code: code.into(), name: None, capacity }
  }

  #[tokio::test]
  async fn sync_then_import_then_calculate() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    sync_programs(&store, &[program("PM", 1)]).await.unwrap();
    sync_programs(&store, &[program("PM", 2)]).await.unwrap();

    let programs = store.list_programs().await.unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].name, "PM");
    assert_eq!(programs[0].capacity, 2);

    let path = std::env::temp_dir().join(format!("admit-roster-{}.csv", std::process::id()));
    std::fs::write(&path, "ID,Consent,Priority,Math\n1,yes,1,90\n2,yes,1,80\n3,yes,9,99\n")
      .unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    let summary = import_file(&store, "PM", date, &path).await.unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!((summary.inserted, summary.updated, summary.errors), (2, 0, 1));

    let result = calculate(&store, date).await.unwrap();
    assert!(!result.from_cache);
    assert_eq!(result.passing_scores[0].passing_score.score, Some(80));

    clear(&store, Some(date)).await.unwrap();
    assert!(!calculate(&store, date).await.unwrap().from_cache);
  }

  #[tokio::test]
  async fn missing_file_is_a_read_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    let err = import_file(&store, "PM", date, Path::new("/nonexistent/roster.csv"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
  }
}
