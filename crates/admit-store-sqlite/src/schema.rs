//! SQL schema for the admission SQLite store.
//!
//! Executed once at connection startup. Dates are stored as ISO `YYYY-MM-DD`
//! text so lexical comparison matches chronological order.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS programs (
    code      TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    capacity  INTEGER NOT NULL CHECK (capacity >= 0)
);

-- One snapshot per candidate per submission date.
-- `total` is always written as the sum of the four sub-scores.
CREATE TABLE IF NOT EXISTS candidates (
    candidate_id  INTEGER NOT NULL,
    submitted_on  TEXT NOT NULL,
    physics_ict   INTEGER NOT NULL,
    russian       INTEGER NOT NULL,
    math          INTEGER NOT NULL,
    achievements  INTEGER NOT NULL,
    total         INTEGER NOT NULL,
    consent       INTEGER NOT NULL,   -- 0 | 1
    PRIMARY KEY (candidate_id, submitted_on)
);

CREATE TABLE IF NOT EXISTS preferences (
    candidate_id  INTEGER NOT NULL,
    program_code  TEXT NOT NULL,
    priority      INTEGER NOT NULL CHECK (priority >= 1),
    submitted_on  TEXT NOT NULL,
    PRIMARY KEY (candidate_id, program_code, submitted_on)
);

-- A candidate is admitted at most once per simulation date.
CREATE TABLE IF NOT EXISTS allocations (
    candidate_id     INTEGER NOT NULL,
    simulation_date  TEXT NOT NULL,
    program_code     TEXT NOT NULL,
    priority         INTEGER NOT NULL,
    score            INTEGER NOT NULL,
    PRIMARY KEY (candidate_id, simulation_date)
);

CREATE TABLE IF NOT EXISTS passing_scores (
    program_code      TEXT NOT NULL,
    calculation_date  TEXT NOT NULL,
    passing_score     INTEGER,          -- NULL when status = 'NO_DATA'
    status            TEXT NOT NULL,    -- 'COMPUTED' | 'UNDERFILLED' | 'NO_DATA'
    computed_at       TEXT NOT NULL,
    PRIMARY KEY (program_code, calculation_date)
);

CREATE INDEX IF NOT EXISTS candidates_date_idx       ON candidates(submitted_on, consent);
CREATE INDEX IF NOT EXISTS preferences_date_idx      ON preferences(submitted_on, program_code, priority);
CREATE INDEX IF NOT EXISTS allocations_date_idx      ON allocations(simulation_date, program_code);
CREATE INDEX IF NOT EXISTS passing_scores_date_idx   ON passing_scores(calculation_date);

PRAGMA user_version = 1;
";
