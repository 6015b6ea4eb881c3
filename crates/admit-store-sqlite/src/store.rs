//! The SQLite implementation of [`AdmissionStore`].

use std::{collections::BTreeMap, path::Path};

use admit_core::{
  allocation::AllocationRecord,
  candidate::{Candidate, CandidateId, UpsertOutcome},
  preference::Preference,
  program::Program,
  simulation::{EmptyRunPolicy, Simulation, simulate},
  store::{
    AdmissionStore, CandidateDetails, CandidateQuery, DateCounts, ImportSummary,
    Materialized, PassingScoreRow, ProgramStatistics, RosterEntry, RosterQuery,
    RosterRow,
  },
};
use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::{info, warn};

use crate::{
  Error, Result,
  encode::{
    CANDIDATE_COLUMNS, RawAllocation, RawCandidate, RawPassingScore, RawPreference,
    RawPreferenceDetail, RawRosterRow, encode_date, encode_status,
  },
  schema::SCHEMA,
  source::{SqlSource, load_programs},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An admission store backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// These run on the database thread, usually inside a transaction.

fn query_passing_scores(
  conn: &rusqlite::Connection,
  from: &str,
  to: &str,
) -> rusqlite::Result<Vec<RawPassingScore>> {
  let mut stmt = conn.prepare_cached(
    "SELECT ps.program_code, ps.calculation_date, ps.passing_score, ps.status,
            p.name, p.capacity
     FROM passing_scores ps
     LEFT JOIN programs p ON p.code = ps.program_code
     WHERE ps.calculation_date >= ?1 AND ps.calculation_date <= ?2
     ORDER BY ps.calculation_date ASC, ps.program_code ASC",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![from, to], |row| {
      Ok(RawPassingScore {
        program_code:     row.get(0)?,
        calculation_date: row.get(1)?,
        passing_score:    row.get(2)?,
        status:           row.get(3)?,
        program_name:     row.get(4)?,
        capacity:         row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Write a candidate snapshot, reporting whether it already existed.
fn upsert_candidate(
  conn: &rusqlite::Connection,
  candidate: &Candidate,
) -> rusqlite::Result<UpsertOutcome> {
  let date_str = encode_date(candidate.submitted_on);
  let exists = conn
    .query_row(
      "SELECT 1 FROM candidates WHERE candidate_id = ?1 AND submitted_on = ?2",
      rusqlite::params![candidate.id, date_str],
      |_| Ok(()),
    )
    .optional()?
    .is_some();

  conn.execute(
    "INSERT INTO candidates (
       candidate_id, submitted_on, physics_ict, russian, math, achievements,
       total, consent
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT (candidate_id, submitted_on) DO UPDATE SET
       physics_ict  = excluded.physics_ict,
       russian      = excluded.russian,
       math         = excluded.math,
       achievements = excluded.achievements,
       total        = excluded.total,
       consent      = excluded.consent",
    rusqlite::params![
      candidate.id,
      date_str,
      candidate.scores.physics_ict,
      candidate.scores.russian,
      candidate.scores.math,
      candidate.scores.achievements,
      candidate.total,
      candidate.consent,
    ],
  )?;

  Ok(if exists { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
}

/// Upsert one roster row's candidate and record its preference for `program`.
fn write_roster_entry(
  conn: &rusqlite::Connection,
  program: &str,
  entry: RosterEntry,
) -> rusqlite::Result<UpsertOutcome> {
  let candidate = Candidate::from(entry.candidate);
  let outcome = upsert_candidate(conn, &candidate)?;
  conn.execute(
    "INSERT INTO preferences (candidate_id, program_code, priority, submitted_on)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (candidate_id, program_code, submitted_on) DO UPDATE SET
       priority = excluded.priority",
    rusqlite::params![
      candidate.id,
      program,
      entry.priority,
      encode_date(candidate.submitted_on),
    ],
  )?;
  Ok(outcome)
}

/// Persist a finished run: allocation records plus passing-score upserts.
fn write_simulation(
  conn: &rusqlite::Connection,
  simulation: &Simulation,
) -> rusqlite::Result<()> {
  let date_str = encode_date(simulation.date);
  let computed_at = Utc::now().to_rfc3339();

  let mut insert = conn.prepare_cached(
    "INSERT INTO allocations (candidate_id, simulation_date, program_code, priority, score)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for record in &simulation.allocation.records {
    insert.execute(rusqlite::params![
      record.candidate_id,
      date_str,
      record.program_code,
      record.priority,
      record.score,
    ])?;
  }

  let mut upsert = conn.prepare_cached(
    "INSERT INTO passing_scores (program_code, calculation_date, passing_score, status, computed_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (program_code, calculation_date) DO UPDATE SET
       passing_score = excluded.passing_score,
       status        = excluded.status,
       computed_at   = excluded.computed_at",
  )?;
  for score in &simulation.passing_scores {
    upsert.execute(rusqlite::params![
      score.program_code,
      encode_date(score.calculated_on),
      score.score,
      encode_status(score.status),
      computed_at,
    ])?;
  }

  Ok(())
}

/// `(program_code, priority, count)` rows of a grouped COUNT query.
fn grouped_counts(
  conn: &rusqlite::Connection,
  sql: &str,
  date_str: &str,
) -> rusqlite::Result<Vec<(String, u32, u64)>> {
  let mut stmt = conn.prepare_cached(sql)?;
  let rows = stmt
    .query_map(rusqlite::params![date_str], |row| {
      let count: i64 = row.get(2)?;
      Ok((row.get(0)?, row.get(1)?, count.max(0) as u64))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn count(conn: &rusqlite::Connection, sql: &str, date_str: &str) -> rusqlite::Result<u64> {
  let n: i64 = conn.query_row(sql, rusqlite::params![date_str], |row| row.get(0))?;
  Ok(n.max(0) as u64)
}

// ─── AdmissionStore impl ─────────────────────────────────────────────────────

impl AdmissionStore for SqliteStore {
  type Error = Error;

  // ── Programs ──────────────────────────────────────────────────────────────

  async fn upsert_program(&self, program: Program) -> Result<UpsertOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM programs WHERE code = ?1",
            rusqlite::params![program.code],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        tx.execute(
          "INSERT INTO programs (code, name, capacity) VALUES (?1, ?2, ?3)
           ON CONFLICT (code) DO UPDATE SET
             name     = excluded.name,
             capacity = excluded.capacity",
          rusqlite::params![program.code, program.name, program.capacity],
        )?;
        tx.commit()?;
        Ok(if exists { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
      })
      .await?;
    Ok(outcome)
  }

  async fn list_programs(&self) -> Result<Vec<Program>> {
    Ok(self.conn.call(|conn| Ok(load_programs(conn)?)).await?)
  }

  // ── Ingestion ─────────────────────────────────────────────────────────────

  async fn import_roster(
    &self,
    program: String,
    date:    NaiveDate,
    entries: Vec<RosterEntry>,
  ) -> Result<ImportSummary> {
    let code     = program.clone();
    let date_str = encode_date(date);

    let summary: Option<ImportSummary> = self
      .conn
      .call(move |conn| {
        let mut tx = conn.transaction()?;
        let known = tx
          .query_row(
            "SELECT 1 FROM programs WHERE code = ?1",
            rusqlite::params![code],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !known {
          return Ok(None);
        }

        tx.execute(
          "DELETE FROM preferences WHERE program_code = ?1 AND submitted_on = ?2",
          rusqlite::params![code, date_str],
        )?;

        let mut summary = ImportSummary::default();
        for entry in entries {
          let candidate_id = entry.candidate.id;
          // One savepoint per row so a failed row leaves no partial writes.
          let row = tx.savepoint()?;
          match write_roster_entry(&row, &code, entry) {
            Ok(outcome) => {
              row.commit()?;
              match outcome {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
              }
            }
            Err(e) => {
              warn!(candidate = candidate_id, error = %e, "roster row rejected");
              summary.errors += 1;
            }
          }
        }

        tx.commit()?;
        Ok(Some(summary))
      })
      .await?;

    let summary = summary.ok_or(Error::UnknownProgram(program))?;
    info!(
      date = %date,
      inserted = summary.inserted,
      updated = summary.updated,
      errors = summary.errors,
      "roster imported"
    );
    Ok(summary)
  }

  // ── Simulation ────────────────────────────────────────────────────────────

  async fn materialize(&self, date: NaiveDate, policy: EmptyRunPolicy) -> Result<Materialized> {
    let date_str = encode_date(date);

    let (from_cache, raws) = self
      .conn
      .call(move |conn| {
        // Take the write lock up front so the cache check and the writes see
        // the same state.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cached = query_passing_scores(&tx, &date_str, &date_str)?;
        if !cached.is_empty() {
          return Ok(Ok((true, cached)));
        }

        tx.execute(
          "DELETE FROM allocations WHERE simulation_date = ?1",
          rusqlite::params![date_str],
        )?;

        let simulation = match simulate(&SqlSource::new(&tx), date, policy) {
          Ok(simulation) => simulation,
          // Dropping `tx` rolls back the delete.
          Err(e) => return Ok(Err(e)),
        };
        write_simulation(&tx, &simulation)?;

        let fresh = query_passing_scores(&tx, &date_str, &date_str)?;
        tx.commit()?;
        Ok(Ok((false, fresh)))
      })
      .await??;

    if from_cache {
      info!(date = %date, "serving stored passing scores");
    } else {
      info!(date = %date, programs = raws.len(), "passing scores computed");
    }

    let passing_scores = raws
      .into_iter()
      .map(RawPassingScore::into_row)
      .collect::<Result<_>>()?;

    Ok(Materialized { date, from_cache, passing_scores })
  }

  async fn clear_results(&self, date: Option<NaiveDate>) -> Result<()> {
    let date_str = date.map(encode_date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match &date_str {
          Some(d) => {
            tx.execute("DELETE FROM allocations WHERE simulation_date = ?1", rusqlite::params![d])?;
            tx.execute("DELETE FROM passing_scores WHERE calculation_date = ?1", rusqlite::params![d])?;
          }
          None => {
            tx.execute_batch("DELETE FROM allocations; DELETE FROM passing_scores;")?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(date = ?date, "computed results cleared");
    Ok(())
  }

  async fn clear_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM allocations;
           DELETE FROM passing_scores;
           DELETE FROM preferences;
           DELETE FROM candidates;",
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!("all candidate data cleared");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_roster(&self, query: RosterQuery) -> Result<Vec<RosterRow>> {
    let date_str = query.date.map(encode_date);

    let raws: Vec<RawRosterRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.candidate_id, p.program_code, p.priority, p.submitted_on,
                  c.physics_ict, c.russian, c.math, c.achievements, c.total, c.consent
           FROM preferences p
           LEFT JOIN candidates c
             ON c.candidate_id = p.candidate_id AND c.submitted_on = p.submitted_on
           WHERE (?1 IS NULL OR p.program_code = ?1)
             AND (?2 IS NULL OR p.submitted_on = ?2)
             AND (?3 IS NULL OR p.candidate_id = ?3)
             AND (?4 IS NULL OR c.consent = ?4)
           ORDER BY c.total DESC, p.candidate_id ASC, p.priority ASC",
        )?;

        let rows = stmt
          .query_map(
            rusqlite::params![query.program, date_str, query.candidate_id, query.consent],
            |row| {
              Ok(RawRosterRow {
                preference:   RawPreference::from_row(row)?,
                physics_ict:  row.get(4)?,
                russian:      row.get(5)?,
                math:         row.get(6)?,
                achievements: row.get(7)?,
                total:        row.get(8)?,
                consent:      row.get(9)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRosterRow::into_row).collect()
  }

  async fn search_candidates(&self, query: CandidateQuery) -> Result<Vec<Candidate>> {
    let date_str = query.date.map(encode_date);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT DISTINCT {CANDIDATE_COLUMNS}
           FROM candidates c
           JOIN preferences p
             ON p.candidate_id = c.candidate_id AND p.submitted_on = c.submitted_on
           WHERE (?1 IS NULL OR c.candidate_id = ?1)
             AND (?2 IS NULL OR c.total >= ?2)
             AND (?3 IS NULL OR c.submitted_on = ?3)
           ORDER BY c.total DESC, c.candidate_id ASC, c.submitted_on DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![query.id, query.min_score, date_str],
            |row| RawCandidate::from_row(row, 0),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn candidate_details(&self, id: CandidateId) -> Result<Option<CandidateDetails>> {
    let raw: Option<(RawCandidate, Vec<RawPreferenceDetail>)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CANDIDATE_COLUMNS}
           FROM candidates c
           WHERE c.candidate_id = ?1
             AND EXISTS (
               SELECT 1 FROM preferences p
               WHERE p.candidate_id = c.candidate_id AND p.submitted_on = c.submitted_on
             )
           ORDER BY c.submitted_on DESC
           LIMIT 1"
        );
        let Some(candidate) = conn
          .query_row(&sql, rusqlite::params![id], |row| RawCandidate::from_row(row, 0))
          .optional()?
        else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT p.candidate_id, p.program_code, p.priority, p.submitted_on, pr.name
           FROM preferences p
           LEFT JOIN programs pr ON pr.code = p.program_code
           WHERE p.candidate_id = ?1
           ORDER BY p.priority ASC, p.submitted_on DESC",
        )?;
        let preferences = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok(RawPreferenceDetail {
              preference:   RawPreference::from_row(row)?,
              program_name: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((candidate, preferences)))
      })
      .await?;

    let Some((candidate, preferences)) = raw else {
      return Ok(None);
    };
    Ok(Some(CandidateDetails {
      candidate:   candidate.into_candidate()?,
      preferences: preferences
        .into_iter()
        .map(RawPreferenceDetail::into_detail)
        .collect::<Result<_>>()?,
    }))
  }

  async fn preferences_on(&self, date: NaiveDate) -> Result<Vec<Preference>> {
    let date_str = encode_date(date);

    let raws: Vec<RawPreference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id, program_code, priority, submitted_on
           FROM preferences
           WHERE submitted_on = ?1
           ORDER BY candidate_id ASC, priority ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawPreference::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPreference::into_preference).collect()
  }

  async fn allocations(
    &self,
    date:    NaiveDate,
    program: Option<String>,
  ) -> Result<Vec<AllocationRecord>> {
    let date_str = encode_date(date);

    let raws: Vec<RawAllocation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id, simulation_date, program_code, priority, score
           FROM allocations
           WHERE simulation_date = ?1
             AND (?2 IS NULL OR program_code = ?2)
           ORDER BY score DESC, priority ASC, candidate_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![date_str, program], |row| {
            Ok(RawAllocation {
              candidate_id:    row.get(0)?,
              simulation_date: row.get(1)?,
              program_code:    row.get(2)?,
              priority:        row.get(3)?,
              score:           row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAllocation::into_record).collect()
  }

  async fn passing_scores(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<PassingScoreRow>> {
    let from_str = encode_date(from);
    let to_str   = encode_date(to);

    let raws = self
      .conn
      .call(move |conn| Ok(query_passing_scores(conn, &from_str, &to_str)?))
      .await?;

    raws.into_iter().map(RawPassingScore::into_row).collect()
  }

  async fn program_statistics(&self, date: NaiveDate) -> Result<Vec<ProgramStatistics>> {
    let date_str = encode_date(date);

    let (programs, applications, enrolled) = self
      .conn
      .call(move |conn| {
        let programs = load_programs(conn)?;
        let applications = grouped_counts(
          conn,
          "SELECT program_code, priority, COUNT(*)
           FROM preferences
           WHERE submitted_on = ?1
           GROUP BY program_code, priority",
          &date_str,
        )?;
        let enrolled = grouped_counts(
          conn,
          "SELECT program_code, priority, COUNT(*)
           FROM allocations
           WHERE simulation_date = ?1
           GROUP BY program_code, priority",
          &date_str,
        )?;
        Ok((programs, applications, enrolled))
      })
      .await?;

    let by_priority = |rows: &[(String, u32, u64)], code: &str| -> BTreeMap<u32, u64> {
      rows
        .iter()
        .filter(|(program, ..)| program == code)
        .map(|(_, priority, n)| (*priority, *n))
        .collect()
    };

    Ok(
      programs
        .into_iter()
        .map(|program| {
          let applications_by_priority = by_priority(&applications, &program.code);
          let enrolled_by_priority = by_priority(&enrolled, &program.code);
          ProgramStatistics {
            applications: applications_by_priority.values().sum(),
            applications_by_priority,
            enrolled_by_priority,
            capacity: program.capacity,
            program_name: program.name,
            program_code: program.code,
          }
        })
        .collect(),
    )
  }

  async fn date_counts(&self, date: NaiveDate) -> Result<DateCounts> {
    let date_str = encode_date(date);

    let counts = self
      .conn
      .call(move |conn| {
        Ok(DateCounts {
          preferences:           count(
            conn,
            "SELECT COUNT(*) FROM preferences WHERE submitted_on = ?1",
            &date_str,
          )?,
          consenting_candidates: count(
            conn,
            "SELECT COUNT(*) FROM candidates WHERE submitted_on = ?1 AND consent = 1",
            &date_str,
          )?,
          allocations:           count(
            conn,
            "SELECT COUNT(*) FROM allocations WHERE simulation_date = ?1",
            &date_str,
          )?,
        })
      })
      .await?;

    Ok(counts)
  }
}
