//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so lexical order matches chronological order.
//! Decoding happens inside row mappers, so failures surface as
//! [`rusqlite::Error::FromSqlConversionFailure`].

use chrono::{DateTime, SecondsFormat, Utc};
use punchcard_core::{attendance::{Action, AttendanceRecord}, identity::Identity};
use rusqlite::{Row, types::Type};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ─── Action ──────────────────────────────────────────────────────────────────

pub fn decode_action(s: &str, column: usize) -> rusqlite::Result<Action> {
  s.parse()
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Columns: `id, identity_handle, action, recorded_at`.
pub const RECORD_COLUMNS: &str = "id, identity_handle, action, recorded_at";

pub fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
  let action: String      = row.get(2)?;
  let recorded_at: String = row.get(3)?;
  Ok(AttendanceRecord {
    id:          row.get(0)?,
    handle:      row.get(1)?,
    action:      decode_action(&action, 2)?,
    recorded_at: decode_dt(&recorded_at, 3)?,
  })
}

/// Columns: `handle, name, role, department, room`.
pub fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
  Ok(Identity {
    handle:     row.get(0)?,
    name:       row.get(1)?,
    role:       row.get(2)?,
    department: row.get(3)?,
    room:       row.get(4)?,
  })
}
