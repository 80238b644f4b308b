//! SQL schema for the course-bidding SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- year is the start year of the academic year: Winter 2025 is stored as
-- (2024, 'winter').
CREATE TABLE IF NOT EXISTS quarters (
    quarter_id               TEXT PRIMARY KEY,
    year                     INTEGER NOT NULL,
    season                   TEXT NOT NULL,   -- 'winter' | 'spring' | 'summer' | 'autumn'
    published                INTEGER NOT NULL DEFAULT 0,
    active                   INTEGER NOT NULL DEFAULT 0,
    course_deadline          TEXT NOT NULL,
    student_bidding_deadline TEXT NOT NULL,
    created_at               TEXT NOT NULL,
    UNIQUE (year, season)
);

-- At most one active quarter.
CREATE UNIQUE INDEX IF NOT EXISTS quarters_active_idx
    ON quarters(active) WHERE active = 1;

CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    cnet            TEXT NOT NULL UNIQUE,
    full_name       TEXT NOT NULL,
    email           TEXT NOT NULL,
    role            TEXT NOT NULL,   -- 'admin' | 'faculty' | 'student'
    course_requests INTEGER NOT NULL DEFAULT 0,
    password_hash   TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_id            TEXT PRIMARY KEY,
    quarter_id           TEXT NOT NULL REFERENCES quarters(quarter_id),
    number               TEXT NOT NULL,
    title                TEXT NOT NULL,
    instructor_id        TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    draft                INTEGER NOT NULL DEFAULT 1,
    published            INTEGER NOT NULL DEFAULT 0,
    syllabus             TEXT,
    prerequisites        TEXT,
    time                 TEXT,
    location             TEXT,
    website              TEXT,
    satisfies            TEXT,
    course_prerequisites TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    UNIQUE (quarter_id, number),
    UNIQUE (quarter_id, title)
);

CREATE TABLE IF NOT EXISTS bids (
    bid_id     TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    course_id  TEXT NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    preference INTEGER NOT NULL CHECK (preference >= 1),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (student_id, course_id)
);

CREATE INDEX IF NOT EXISTS courses_quarter_idx    ON courses(quarter_id);
CREATE INDEX IF NOT EXISTS courses_instructor_idx ON courses(instructor_id);
CREATE INDEX IF NOT EXISTS bids_course_idx        ON bids(course_id);

PRAGMA user_version = 1;
";
