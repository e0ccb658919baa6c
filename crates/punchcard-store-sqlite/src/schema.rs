//! SQL schema for the Punchcard SQLite store.
//!
//! Executed once at connection startup. Identities, roles and departments are
//! owned by the user-management side; the bridge only creates the tables if
//! they are missing.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS departments (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS identities (
    handle         INTEGER PRIMARY KEY,
    name           TEXT NOT NULL,
    role_id        INTEGER REFERENCES roles(id),
    department_id  INTEGER REFERENCES departments(id),
    room           TEXT,
    template_blob  BLOB             -- overwritten wholesale on enrollment
);

-- Attendance records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS attendance_records (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_handle  INTEGER NOT NULL REFERENCES identities(handle),
    action           TEXT NOT NULL CHECK (action IN ('checkin', 'checkout')),
    recorded_at      TEXT NOT NULL   -- RFC 3339 UTC, fixed width; server-assigned
);

CREATE INDEX IF NOT EXISTS attendance_latest_idx
    ON attendance_records(identity_handle, recorded_at, id);

-- Serves the table-wide MAX(recorded_at) taken on every insert.
CREATE INDEX IF NOT EXISTS attendance_recorded_idx
    ON attendance_records(recorded_at);

PRAGMA user_version = 1;
";
